//! Entity records and the validated feature space
//!
//! The feature space is the only entry point for data into the Mapper core.
//! Records come from an external feature provider; this module validates them
//! once and fixes their order.
//!
//! # Invariants
//!
//! - At least one entity
//! - Every feature vector has the same, non-zero length
//! - Every feature value and auxiliary scalar is finite
//! - Entity identifiers are unique
//! - Entities are stored in ascending identifier order, so an [`EntityIndex`]
//!   is also the tie-break rank used by clustering
//!
//! # Serialization
//!
//! ```json
//! {
//!   "feature_names": ["energy_score", "win_perc", "aggression_score"],
//!   "entities": [
//!     {
//!       "id": "Michigan",
//!       "label": "The Victors",
//!       "features": [7.2, 0.732, 10.0],
//!       "win_percentage": 0.732,
//!       "spirit_score": 8.6
//!     }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{FeatureVectorIssue, MapperError};

/// Position of an entity inside a [`FeatureSpace`] (ascending identifier order).
pub type EntityIndex = usize;

/// Stable identifier of an entity (for example, a school name).
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct EntityId(String);

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl EntityId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One input record as produced by the feature provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Stable, unique identifier
    pub id: EntityId,
    /// Optional display label (e.g. the song name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// High-dimensional feature vector used for lens and clustering
    pub features: Vec<f64>,
    /// Auxiliary scalar used only for annotation and display
    pub win_percentage: f64,
    /// Auxiliary scalar used only for annotation and display
    pub spirit_score: f64,
}

/// Serializable collection of entity records with named feature dimensions.
///
/// This is the document exchanged between the feature provider and the Mapper core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDataset {
    /// Names of the feature dimensions; may be empty, in which case names are generated
    #[serde(default)]
    pub feature_names: Vec<String>,
    pub entities: Vec<EntityRecord>,
}

impl EntityDataset {
    /// Validates the dataset and builds a [`FeatureSpace`].
    pub fn into_feature_space(self) -> Result<FeatureSpace, MapperError> {
        FeatureSpace::new(self.feature_names, self.entities)
    }
}

/// Validated, identifier-ordered set of entities.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSpace {
    feature_names: Vec<String>,
    entities: Vec<EntityRecord>,
}

impl FeatureSpace {
    /// Validates `records` and fixes their order.
    ///
    /// If `feature_names` is empty, the dimension is taken from the first record and
    /// names `f0`, `f1`, ... are generated.
    ///
    /// # Errors
    ///
    /// - [`MapperError::EmptyDataset`] if `records` is empty
    /// - [`MapperError::InvalidFeatureVector`] on a length mismatch, an empty vector,
    ///   or a non-finite feature or auxiliary value
    /// - [`MapperError::DuplicateEntity`] if two records share an identifier
    ///
    /// # Examples
    ///
    /// ```
    /// use anthem_mapper::feature_space::{EntityRecord, FeatureSpace};
    ///
    /// let record = |id: &str, x: f64| EntityRecord {
    ///     id: id.into(),
    ///     label: None,
    ///     features: vec![x, 1.0],
    ///     win_percentage: 0.5,
    ///     spirit_score: 5.0,
    /// };
    /// let space = FeatureSpace::new(vec![], vec![record("b", 2.0), record("a", 1.0)]).unwrap();
    /// assert_eq!(space.entity(0).id.as_str(), "a");
    /// assert_eq!(space.feature_names(), ["f0", "f1"]);
    /// ```
    pub fn new(
        feature_names: Vec<String>,
        mut records: Vec<EntityRecord>,
    ) -> Result<Self, MapperError> {
        let Some(first) = records.first() else {
            return Err(MapperError::EmptyDataset);
        };

        let feature_names = if feature_names.is_empty() {
            (0..first.features.len()).map(|i| format!("f{i}")).collect()
        } else {
            feature_names
        };
        let dimension = feature_names.len();

        for record in &records {
            validate_record(record, &feature_names)?;
        }
        if dimension == 0 {
            return Err(MapperError::InvalidFeatureVector {
                entity: first.id.clone(),
                issue: FeatureVectorIssue::Empty,
            });
        }

        records.sort_by(|a, b| a.id.cmp(&b.id));
        if let Some(pair) = records.windows(2).find(|pair| pair[0].id == pair[1].id) {
            return Err(MapperError::DuplicateEntity {
                entity: pair[0].id.clone(),
            });
        }

        Ok(Self {
            feature_names,
            entities: records,
        })
    }

    /// Number of entities (always at least one).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Always `false`; an empty feature space cannot be constructed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Length of every feature vector.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.feature_names.len()
    }

    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    #[must_use]
    pub fn entities(&self) -> &[EntityRecord] {
        &self.entities
    }

    #[must_use]
    pub fn entity(&self, index: EntityIndex) -> &EntityRecord {
        &self.entities[index]
    }

    /// Looks up the index of an entity by identifier.
    #[must_use]
    pub fn index_of(&self, id: &EntityId) -> Option<EntityIndex> {
        self.entities.binary_search_by(|e| e.id.cmp(id)).ok()
    }
}

fn validate_record(record: &EntityRecord, feature_names: &[String]) -> Result<(), MapperError> {
    let invalid = |issue| MapperError::InvalidFeatureVector {
        entity: record.id.clone(),
        issue,
    };

    if record.features.len() != feature_names.len() {
        return Err(invalid(FeatureVectorIssue::LengthMismatch {
            expected: feature_names.len(),
            actual: record.features.len(),
        }));
    }
    if let Some((name, _)) = feature_names
        .iter()
        .zip(&record.features)
        .find(|(_, value)| !value.is_finite())
    {
        return Err(invalid(FeatureVectorIssue::NonFinite {
            dimension: name.clone(),
        }));
    }
    for (name, value) in [
        ("win_percentage", record.win_percentage),
        ("spirit_score", record.spirit_score),
    ] {
        if !value.is_finite() {
            return Err(invalid(FeatureVectorIssue::NonFinite {
                dimension: name.to_owned(),
            }));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, features: Vec<f64>) -> EntityRecord {
        EntityRecord {
            id: id.into(),
            label: None,
            features,
            win_percentage: 0.5,
            spirit_score: 5.0,
        }
    }

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("x{i}")).collect()
    }

    #[test]
    fn test_empty_dataset_is_rejected() {
        let err = FeatureSpace::new(names(2), vec![]).unwrap_err();
        assert_eq!(err, MapperError::EmptyDataset);
    }

    #[test]
    fn test_entities_are_sorted_by_id() {
        let space = FeatureSpace::new(
            names(1),
            vec![
                record("Purdue", vec![1.0]),
                record("Iowa", vec![2.0]),
                record("Oregon", vec![3.0]),
            ],
        )
        .unwrap();
        let ids = space
            .entities()
            .iter()
            .map(|e| e.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, ["Iowa", "Oregon", "Purdue"]);
        assert_eq!(space.index_of(&"Oregon".into()), Some(1));
        assert_eq!(space.index_of(&"Texas".into()), None);
    }

    #[test]
    fn test_length_mismatch_names_entity() {
        let err = FeatureSpace::new(
            names(2),
            vec![record("a", vec![1.0, 2.0]), record("b", vec![1.0])],
        )
        .unwrap_err();
        assert_eq!(
            err,
            MapperError::InvalidFeatureVector {
                entity: "b".into(),
                issue: FeatureVectorIssue::LengthMismatch {
                    expected: 2,
                    actual: 1
                },
            }
        );
        assert!(err.to_string().contains("'b'"));
    }

    #[test]
    fn test_non_finite_feature_is_rejected() {
        let err = FeatureSpace::new(names(2), vec![record("a", vec![1.0, f64::NAN])]).unwrap_err();
        assert_eq!(
            err,
            MapperError::InvalidFeatureVector {
                entity: "a".into(),
                issue: FeatureVectorIssue::NonFinite {
                    dimension: "x1".into()
                },
            }
        );
    }

    #[test]
    fn test_non_finite_auxiliary_is_rejected() {
        let mut bad = record("a", vec![1.0]);
        bad.win_percentage = f64::INFINITY;
        let err = FeatureSpace::new(names(1), vec![bad]).unwrap_err();
        assert!(matches!(
            err,
            MapperError::InvalidFeatureVector {
                issue: FeatureVectorIssue::NonFinite { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let err = FeatureSpace::new(
            names(1),
            vec![record("a", vec![1.0]), record("a", vec![2.0])],
        )
        .unwrap_err();
        assert_eq!(err, MapperError::DuplicateEntity { entity: "a".into() });
    }

    #[test]
    fn test_zero_dimension_is_rejected() {
        let err = FeatureSpace::new(vec![], vec![record("a", vec![])]).unwrap_err();
        assert!(matches!(
            err,
            MapperError::InvalidFeatureVector {
                issue: FeatureVectorIssue::Empty,
                ..
            }
        ));
    }

    #[test]
    fn test_dataset_json_roundtrip_into_space() {
        let json = r#"{
            "feature_names": ["energy", "cliche"],
            "entities": [
                {"id": "Rutgers", "features": [3.0, 4.0], "win_percentage": 0.491, "spirit_score": 4.5},
                {"id": "Indiana", "label": "Indiana, Our Indiana", "features": [5.0, 2.0], "win_percentage": 0.421, "spirit_score": 3.0}
            ]
        }"#;
        let dataset: EntityDataset = serde_json::from_str(json).unwrap();
        let space = dataset.into_feature_space().unwrap();
        assert_eq!(space.len(), 2);
        assert_eq!(space.dimension(), 2);
        assert_eq!(space.entity(0).id.as_str(), "Indiana");
        assert_eq!(space.entity(0).label.as_deref(), Some("Indiana, Our Indiana"));
    }
}
