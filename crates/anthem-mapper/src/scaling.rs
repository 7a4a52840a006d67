use anthem_stats::descriptive::DescriptiveStats;

use crate::{config::Scaling, feature_space::FeatureSpace};

/// Per-dimension affine transform fitted once over the whole dataset.
///
/// With [`Scaling::Standard`] each dimension is centered on its mean and divided by its
/// population standard deviation; a constant dimension keeps a scale of 1 so it maps
/// to zero instead of dividing by zero.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureScaler {
    offsets: Vec<f64>,
    scales: Vec<f64>,
}

impl FeatureScaler {
    /// Fits the scaler in a single pass over `space`.
    #[must_use]
    pub fn fit(space: &FeatureSpace, scaling: Scaling) -> Self {
        let dimension = space.dimension();
        match scaling {
            Scaling::None => Self {
                offsets: vec![0.0; dimension],
                scales: vec![1.0; dimension],
            },
            Scaling::Standard => {
                let (offsets, scales) = (0..dimension)
                    .map(|d| {
                        let column = space.entities().iter().map(|e| e.features[d]);
                        // FeatureSpace is never empty, so `None` does not occur
                        DescriptiveStats::new(column).map_or((0.0, 1.0), |stats| {
                            let scale = if stats.std_dev > 0.0 {
                                stats.std_dev
                            } else {
                                1.0
                            };
                            (stats.mean, scale)
                        })
                    })
                    .unzip();
                Self { offsets, scales }
            }
        }
    }

    /// Applies the fitted transform to one feature vector.
    #[must_use]
    pub fn transform(&self, features: &[f64]) -> Vec<f64> {
        features
            .iter()
            .zip(self.offsets.iter().zip(&self.scales))
            .map(|(value, (offset, scale))| (value - offset) / scale)
            .collect()
    }

    /// Transforms every entity of `space`, in entity order.
    #[must_use]
    pub fn transform_space(&self, space: &FeatureSpace) -> Vec<Vec<f64>> {
        space
            .entities()
            .iter()
            .map(|e| self.transform(&e.features))
            .collect()
    }
}
