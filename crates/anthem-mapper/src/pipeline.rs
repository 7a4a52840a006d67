use crate::{
    annotate::{AnnotatedGraph, TopologyAnnotator},
    cluster::{BinClusterer, Cluster},
    config::MapperConfig,
    cover::{Cover, CoverBuilder, LensRange},
    error::MapperError,
    feature_space::FeatureSpace,
    graph::MapperGraphBuilder,
    lens::{LensCoordinate, LensProjector},
    scaling::FeatureScaler,
};

/// The linear Mapper pipeline bound to one validated configuration.
///
/// Each [`run`](Self::run) goes feature space → scaling → lens → cover → clustering →
/// graph → annotation and keeps no state between runs.
#[derive(Debug, Clone)]
pub struct MapperPipeline {
    config: MapperConfig,
}

/// Every intermediate product of one run.
#[derive(Debug, Clone)]
pub struct MapperRun {
    pub lens: Vec<LensCoordinate>,
    pub cover: Cover,
    pub clusters: Vec<Cluster>,
    pub annotated: AnnotatedGraph,
}

impl MapperPipeline {
    /// # Errors
    ///
    /// Returns [`MapperError::InvalidConfiguration`] for the first invalid field.
    pub fn new(config: MapperConfig) -> Result<Self, MapperError> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Runs the pipeline over `space`.
    ///
    /// Scaling statistics and the lens basis are fitted once over the whole space
    /// before any entity is projected. The scaled vectors feed both the lens and the
    /// clustering distance.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::InvalidLens`] if the lens does not fit the feature space.
    pub fn run(&self, space: &FeatureSpace) -> Result<MapperRun, MapperError> {
        let config = &self.config;
        log::debug!(
            "running mapper over {} entities with {} features",
            space.len(),
            space.dimension()
        );

        let scaler = FeatureScaler::fit(space, config.scaling);
        let vectors = scaler.transform_space(space);

        let projector =
            LensProjector::fit(&config.lens, config.lens_dimensions, space.dimension(), &vectors)?;
        let lens = projector.project_all(&vectors);

        let range = LensRange::of(&lens);
        let cover =
            CoverBuilder::new(config.resolution, config.overlap_fraction).build(&range, &lens);

        let clusters =
            BinClusterer::from_config(config).cluster_cover(&cover, &vectors, config.parallel);
        let graph = MapperGraphBuilder::new(space)
            .parallel(config.parallel)
            .build(&clusters);
        let annotated = TopologyAnnotator::from_config(config).annotate(graph);

        Ok(MapperRun {
            lens,
            cover,
            clusters,
            annotated,
        })
    }
}
