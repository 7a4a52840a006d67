use std::path::PathBuf;

use anthem_mapper::{
    config::{DistanceThreshold, MapperConfig, Metric, Scaling},
    pipeline::MapperPipeline,
};
use anyhow::Context;
use chrono::Utc;

use crate::{
    schema::graph_document::GraphDocument,
    util::{self, Output},
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct MapArg {
    /// Path to the entities JSON file
    entities: PathBuf,
    /// Mapper configuration JSON file (defaults are used when omitted)
    #[arg(long)]
    config: Option<PathBuf>,
    #[clap(flatten)]
    overrides: ConfigOverrides,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

/// Command-line overrides applied on top of the configuration file
#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ConfigOverrides {
    /// Number of cover intervals per lens dimension
    #[arg(long)]
    resolution: Option<usize>,
    /// Overlap between adjacent cover intervals, in [0, 1)
    #[arg(long)]
    overlap: Option<f64>,
    /// Single-linkage cut distance, or "auto"
    #[arg(long)]
    threshold: Option<DistanceThreshold>,
    /// Lens output dimensions (1 or 2)
    #[arg(long)]
    lens_dimensions: Option<usize>,
    /// Distance metric (euclidean, manhattan, chebyshev)
    #[arg(long)]
    metric: Option<Metric>,
    /// Feature scaling (none, standard)
    #[arg(long)]
    scaling: Option<Scaling>,
    /// Components with fewer nodes are dead zones
    #[arg(long)]
    dead_zone_min_size: Option<usize>,
    /// Shortest accepted manifold cycle
    #[arg(long)]
    min_cycle_length: Option<usize>,
    /// Mean win percentage a manifold node must exceed
    #[arg(long)]
    win_threshold: Option<f64>,
    /// Mean spirit score a manifold node must exceed
    #[arg(long)]
    spirit_threshold: Option<f64>,
    /// Cluster and build edges on a single thread
    #[arg(long)]
    sequential: bool,
}

impl ConfigOverrides {
    fn apply(&self, config: &mut MapperConfig) {
        if let Some(resolution) = self.resolution {
            config.resolution = resolution;
        }
        if let Some(overlap) = self.overlap {
            config.overlap_fraction = overlap;
        }
        if let Some(threshold) = self.threshold {
            config.cluster_distance_threshold = threshold;
        }
        if let Some(lens_dimensions) = self.lens_dimensions {
            config.lens_dimensions = lens_dimensions;
        }
        if let Some(metric) = self.metric {
            config.metric = metric;
        }
        if let Some(scaling) = self.scaling {
            config.scaling = scaling;
        }
        if let Some(size) = self.dead_zone_min_size {
            config.dead_zone_min_size = size;
        }
        if let Some(length) = self.min_cycle_length {
            config.manifold_min_cycle_length = length;
        }
        if let Some(win) = self.win_threshold {
            config.manifold_win_threshold = win;
        }
        if let Some(spirit) = self.spirit_threshold {
            config.manifold_spirit_threshold = spirit;
        }
        if self.sequential {
            config.parallel = false;
        }
    }
}

pub(crate) fn run(arg: &MapArg) -> anyhow::Result<()> {
    let mut config = match &arg.config {
        Some(path) => util::read_config_file(path)?,
        None => MapperConfig::default(),
    };
    arg.overrides.apply(&mut config);
    log::debug!("mapper configuration: {config:?}");
    let pipeline = MapperPipeline::new(config).context("Invalid mapper configuration")?;

    let dataset = util::read_entities_file(&arg.entities)?;
    let space = dataset
        .into_feature_space()
        .with_context(|| format!("Invalid entities in {}", arg.entities.display()))?;
    eprintln!(
        "Mapping {} entities with {} features...",
        space.len(),
        space.dimension()
    );

    let run = pipeline.run(&space).context("Mapper run failed")?;
    let graph = &run.annotated.graph;
    eprintln!(
        "Built {} nodes and {} edges from {} occupied cover elements",
        graph.nodes().len(),
        graph.edges().len(),
        run.cover.occupied().count()
    );
    match &run.annotated.manifold {
        Some(manifold) => eprintln!(
            "Winning manifold: {} nodes (mean win {:.3})",
            manifold.nodes.len(),
            manifold.mean_win_percentage
        ),
        None => eprintln!("No winning manifold"),
    }
    eprintln!("Dead zones: {}", run.annotated.dead_zones.len());

    let document = GraphDocument {
        generated_at: Utc::now(),
        config: pipeline.config().clone(),
        entity_count: space.len(),
        diagnostics: run.cover.diagnostics().to_vec(),
        graph: run.annotated,
    };
    Output::save_json(&document, arg.output.clone())?;
    Ok(())
}

pub(crate) fn print_default_config() -> anyhow::Result<()> {
    Output::save_json(&MapperConfig::default(), None)
}
