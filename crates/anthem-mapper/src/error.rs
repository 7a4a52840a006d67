use crate::feature_space::EntityId;

/// Errors that abort a Mapper run.
///
/// Every variant is detected at the pipeline boundary, before lens or cover work
/// starts, and identifies the failing stage and the offending input.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum MapperError {
    #[display("feature space: entity '{entity}' has an invalid feature vector ({issue})")]
    InvalidFeatureVector {
        entity: EntityId,
        issue: FeatureVectorIssue,
    },
    #[display("feature space: entity '{entity}' appears more than once")]
    DuplicateEntity { entity: EntityId },
    #[display("feature space: no entities supplied")]
    EmptyDataset,
    #[display("configuration: invalid `{field}` ({reason})")]
    InvalidConfiguration { field: &'static str, reason: String },
    #[display("lens: {reason}")]
    InvalidLens { reason: String },
}

/// What is wrong with a single entity's feature vector.
#[derive(Debug, Clone, PartialEq, derive_more::Display)]
pub enum FeatureVectorIssue {
    #[display("expected {expected} dimensions, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[display("non-finite value in `{dimension}`")]
    NonFinite { dimension: String },
    #[display("feature vector is empty")]
    Empty,
}

impl MapperError {
    pub(crate) fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_lens(reason: impl Into<String>) -> Self {
        Self::InvalidLens {
            reason: reason.into(),
        }
    }
}
