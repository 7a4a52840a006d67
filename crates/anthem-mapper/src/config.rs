//! Pipeline configuration
//!
//! [`MapperConfig`] is the single explicit configuration of a Mapper run. There are no
//! hidden defaults: every value used by any stage, including the parameters of the
//! `"auto"` clustering threshold rule, is a field here and is serialized with the
//! resulting graph.
//!
//! # Serialization
//!
//! ```json
//! {
//!   "lens_dimensions": 2,
//!   "lens": { "kind": "pca" },
//!   "scaling": "standard",
//!   "resolution": 5,
//!   "overlap_fraction": 0.5,
//!   "cluster_distance_threshold": 1.5,
//!   "auto_threshold_bins": 10,
//!   "metric": "euclidean",
//!   "dead_zone_min_size": 2,
//!   "manifold_min_cycle_length": 3,
//!   "manifold_win_threshold": 0.55,
//!   "manifold_spirit_threshold": 5.5,
//!   "parallel": true
//! }
//! ```
//!
//! `cluster_distance_threshold` is either a positive number or the string `"auto"`.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{error::MapperError, lens::MAX_LENS_DIMENSIONS};

/// Complete configuration of a Mapper pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Dimensionality of the lens coordinate (1 or 2)
    pub lens_dimensions: usize,
    /// How the lens coordinate is derived from a feature vector
    pub lens: LensConfig,
    /// Dataset-wide scaling applied to feature vectors before lens and clustering
    pub scaling: Scaling,
    /// Number of cover intervals per lens dimension
    pub resolution: usize,
    /// Fraction of an interval's width shared with its neighbor, in `[0, 1)`
    pub overlap_fraction: f64,
    /// Single-linkage cut height, or the `"auto"` histogram-gap rule
    pub cluster_distance_threshold: DistanceThreshold,
    /// Number of histogram bins used by the `"auto"` threshold rule
    pub auto_threshold_bins: usize,
    /// Distance used for clustering in feature space
    pub metric: Metric,
    /// Components with fewer nodes than this are dead zones
    pub dead_zone_min_size: usize,
    /// Shortest cycle accepted as a winning manifold
    pub manifold_min_cycle_length: usize,
    /// A manifold node's mean win percentage must exceed this
    pub manifold_win_threshold: f64,
    /// A manifold node's mean spirit score must exceed this
    pub manifold_spirit_threshold: f64,
    /// Cluster cover elements on the rayon thread pool
    pub parallel: bool,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            lens_dimensions: 2,
            lens: LensConfig::Pca,
            scaling: Scaling::Standard,
            resolution: 5,
            overlap_fraction: 0.5,
            cluster_distance_threshold: DistanceThreshold::Fixed(1.5),
            auto_threshold_bins: 10,
            metric: Metric::Euclidean,
            dead_zone_min_size: 2,
            manifold_min_cycle_length: 3,
            manifold_win_threshold: 0.55,
            manifold_spirit_threshold: 5.5,
            parallel: true,
        }
    }
}

impl MapperConfig {
    /// Checks every field, reporting the first invalid one.
    ///
    /// # Examples
    ///
    /// ```
    /// use anthem_mapper::config::MapperConfig;
    ///
    /// let config = MapperConfig {
    ///     overlap_fraction: 1.0,
    ///     ..MapperConfig::default()
    /// };
    /// assert!(config.validate().is_err());
    /// assert!(MapperConfig::default().validate().is_ok());
    /// ```
    pub fn validate(&self) -> Result<(), MapperError> {
        if self.lens_dimensions == 0 || self.lens_dimensions > MAX_LENS_DIMENSIONS {
            return Err(MapperError::invalid_config(
                "lens_dimensions",
                format!(
                    "must be between 1 and {MAX_LENS_DIMENSIONS}, got {}",
                    self.lens_dimensions
                ),
            ));
        }
        if let LensConfig::Columns { columns } = &self.lens
            && columns.len() != self.lens_dimensions
        {
            return Err(MapperError::invalid_config(
                "lens",
                format!(
                    "{} columns selected for a {}-dimensional lens",
                    columns.len(),
                    self.lens_dimensions
                ),
            ));
        }
        if self.resolution < 1 {
            return Err(MapperError::invalid_config("resolution", "must be at least 1"));
        }
        if !(0.0..1.0).contains(&self.overlap_fraction) {
            return Err(MapperError::invalid_config(
                "overlap_fraction",
                format!("must be in [0, 1), got {}", self.overlap_fraction),
            ));
        }
        if let DistanceThreshold::Fixed(threshold) = self.cluster_distance_threshold
            && !(threshold.is_finite() && threshold > 0.0)
        {
            return Err(MapperError::invalid_config(
                "cluster_distance_threshold",
                format!("must be a positive number or \"auto\", got {threshold}"),
            ));
        }
        if self.auto_threshold_bins < 2 {
            return Err(MapperError::invalid_config(
                "auto_threshold_bins",
                "must be at least 2",
            ));
        }
        if self.dead_zone_min_size < 1 {
            return Err(MapperError::invalid_config(
                "dead_zone_min_size",
                "must be at least 1",
            ));
        }
        if self.manifold_min_cycle_length < 3 {
            return Err(MapperError::invalid_config(
                "manifold_min_cycle_length",
                "must be at least 3",
            ));
        }
        for (field, value) in [
            ("manifold_win_threshold", self.manifold_win_threshold),
            ("manifold_spirit_threshold", self.manifold_spirit_threshold),
        ] {
            if !value.is_finite() {
                return Err(MapperError::invalid_config(field, "must be finite"));
            }
        }
        Ok(())
    }
}

/// Lens strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LensConfig {
    /// Use the selected feature dimensions directly (after scaling)
    Columns { columns: Vec<usize> },
    /// Project onto the leading principal axes of the dataset
    Pca,
}

/// Dataset-wide feature scaling.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::FromStr,
)]
#[serde(rename_all = "snake_case")]
pub enum Scaling {
    /// Use feature values as given
    None,
    /// Z-score each dimension with the dataset mean and population standard deviation
    #[default]
    Standard,
}

/// Distance between two feature vectors.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::FromStr,
)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    #[default]
    Euclidean,
    Manhattan,
    Chebyshev,
}

impl Metric {
    /// Distance between `a` and `b`.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if the vectors differ in length.
    #[must_use]
    pub fn distance(self, a: &[f64], b: &[f64]) -> f64 {
        debug_assert_eq!(a.len(), b.len(), "feature vectors differ in length");
        let diffs = a.iter().zip(b).map(|(x, y)| (x - y).abs());
        match self {
            Metric::Euclidean => diffs.map(|d| d * d).sum::<f64>().sqrt(),
            Metric::Manhattan => diffs.sum(),
            Metric::Chebyshev => diffs.fold(0.0, f64::max),
        }
    }
}

/// Single-linkage cut height for per-bin clustering.
///
/// Serialized as a plain number, or as the string `"auto"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DistanceThreshold {
    /// Merge clusters whose closest members are at most this far apart
    Fixed(f64),
    /// Cut at the first empty bin of the merge-height histogram
    Auto,
}

impl fmt::Display for DistanceThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceThreshold::Fixed(threshold) => fmt::Display::fmt(threshold, f),
            DistanceThreshold::Auto => f.write_str("auto"),
        }
    }
}

/// Error returned when parsing a [`DistanceThreshold`] from a string fails.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("expected a positive number or \"auto\", got '{input}'")]
pub struct ParseThresholdError {
    input: String,
}

impl FromStr for DistanceThreshold {
    type Err = ParseThresholdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("auto") {
            return Ok(DistanceThreshold::Auto);
        }
        s.parse::<f64>()
            .map(DistanceThreshold::Fixed)
            .map_err(|_| ParseThresholdError {
                input: s.to_owned(),
            })
    }
}

impl Serialize for DistanceThreshold {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            DistanceThreshold::Fixed(threshold) => serializer.serialize_f64(*threshold),
            DistanceThreshold::Auto => serializer.serialize_str("auto"),
        }
    }
}

impl<'de> Deserialize<'de> for DistanceThreshold {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(threshold) => Ok(DistanceThreshold::Fixed(threshold)),
            Repr::Text(text) if text == "auto" => Ok(DistanceThreshold::Auto),
            Repr::Text(text) => Err(serde::de::Error::custom(format!(
                "invalid threshold: expected a number or \"auto\", got \"{text}\""
            ))),
        }
    }
}
