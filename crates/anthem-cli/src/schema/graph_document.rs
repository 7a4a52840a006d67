use anthem_mapper::{annotate::AnnotatedGraph, config::MapperConfig, cover::CoverDiagnostic};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mapper run output handed to the renderer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphDocument {
    /// Timestamp when the graph was generated (ISO 8601 format)
    pub generated_at: DateTime<Utc>,
    /// Configuration the graph was built with
    pub config: MapperConfig,
    /// Number of input entities
    pub entity_count: usize,
    /// Non-fatal observations from cover construction
    #[serde(default)]
    pub diagnostics: Vec<CoverDiagnostic>,
    /// Nodes, edges and annotations
    pub graph: AnnotatedGraph,
}
