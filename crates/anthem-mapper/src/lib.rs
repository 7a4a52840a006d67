//! Mapper construction and graph annotation for fight-song feature data.
//!
//! The crate turns a set of entities (schools), each with a numeric feature vector,
//! into a Mapper graph: overlapping regions of a low-dimensional lens are clustered in
//! the original feature space, clusters become nodes, and clusters sharing entities are
//! joined by weighted edges. The graph is then annotated with a winning manifold (a
//! cycle of high-win, high-spirit nodes) and dead zones (isolated or undersized
//! components).
//!
//! # Modules
//!
//! - [`feature_space`]: validated, identifier-ordered entity records
//! - [`config`]: pipeline configuration and its validation
//! - [`scaling`]: dataset-wide feature standardization
//! - [`lens`]: column-selection and principal-component lenses
//! - [`cover`]: overlapping interval and rectangle covers of the lens range
//! - [`cluster`]: deterministic single-linkage clustering per cover element
//! - [`graph`]: node/edge assembly through an inverted membership index
//! - [`annotate`]: winning-manifold and dead-zone detection
//! - [`pipeline`]: the end-to-end run
//!
//! # Examples
//!
//! ```
//! use anthem_mapper::{
//!     config::{DistanceThreshold, MapperConfig},
//!     feature_space::{EntityRecord, FeatureSpace},
//!     pipeline::MapperPipeline,
//! };
//!
//! let records = (0..6)
//!     .map(|i| EntityRecord {
//!         id: format!("school{i}").into(),
//!         label: None,
//!         features: vec![f64::from(i), f64::from(i % 2)],
//!         win_percentage: 0.6,
//!         spirit_score: 6.0,
//!     })
//!     .collect();
//! let space = FeatureSpace::new(vec![], records)?;
//! let config = MapperConfig {
//!     cluster_distance_threshold: DistanceThreshold::Auto,
//!     ..MapperConfig::default()
//! };
//! let run = MapperPipeline::new(config)?.run(&space)?;
//! assert!(!run.annotated.graph.nodes().is_empty());
//! # Ok::<(), anthem_mapper::error::MapperError>(())
//! ```

pub mod annotate;
pub mod cluster;
pub mod config;
pub mod cover;
pub mod error;
pub mod feature_space;
pub mod graph;
pub mod lens;
pub mod pipeline;
pub mod scaling;
