//! Lens projection
//!
//! A lens maps each (scaled) feature vector to a low-dimensional coordinate that only
//! drives the cover; clustering never looks at it.
//!
//! # Strategies
//!
//! - **Columns**: pick one or two feature dimensions as-is
//! - **PCA**: project onto the leading principal axes of the dataset
//!
//! Any dataset-wide statistic (the PCA center and axes) is fitted once in
//! [`LensProjector::fit`] and frozen in the projector. After fitting, projection is a
//! pure function of the feature vector: the same vector always yields the same
//! coordinate, independent of entity order or previous calls.
//!
//! # PCA determinism
//!
//! Principal axes are the eigenvectors of the covariance matrix, computed with
//! nalgebra's symmetric eigen solver, which involves no random initialization. Axes
//! are ordered by decreasing eigenvalue (a stable sort, so ties keep the solver's
//! order) and each axis is signed so that its largest-magnitude component is positive.

use arrayvec::ArrayVec;
use nalgebra::{DMatrix, SymmetricEigen};

use crate::{config::LensConfig, error::MapperError};

/// Upper bound on lens dimensionality.
pub const MAX_LENS_DIMENSIONS: usize = 2;

/// Lens coordinate of one entity.
pub type LensCoordinate = ArrayVec<f64, MAX_LENS_DIMENSIONS>;

/// A fitted lens.
#[derive(Debug, Clone, PartialEq)]
pub enum LensProjector {
    /// Selects feature dimensions by index
    Columns(ArrayVec<usize, MAX_LENS_DIMENSIONS>),
    /// Centers the vector and projects onto fixed axes
    Linear {
        center: Vec<f64>,
        axes: ArrayVec<Vec<f64>, MAX_LENS_DIMENSIONS>,
    },
}

impl LensProjector {
    /// Fits the lens described by `config` over `vectors`.
    ///
    /// `dimension` is the length of every vector in `vectors`.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::InvalidLens`] if the lens asks for more dimensions than
    /// supported or than the feature space has, or selects a column that does not exist.
    ///
    /// # Examples
    ///
    /// ```
    /// use anthem_mapper::{config::LensConfig, lens::LensProjector};
    ///
    /// // Points along the diagonal: the first principal axis is (1, 1) / sqrt(2).
    /// let vectors = vec![vec![-1.0, -1.0], vec![0.0, 0.0], vec![1.0, 1.0]];
    /// let lens = LensProjector::fit(&LensConfig::Pca, 1, 2, &vectors).unwrap();
    /// let coordinate = lens.project(&[1.0, 1.0]);
    /// assert!((coordinate[0] - 2.0_f64.sqrt()).abs() < 1e-9);
    /// ```
    pub fn fit(
        config: &LensConfig,
        lens_dimensions: usize,
        dimension: usize,
        vectors: &[Vec<f64>],
    ) -> Result<Self, MapperError> {
        if lens_dimensions == 0 || lens_dimensions > MAX_LENS_DIMENSIONS {
            return Err(MapperError::invalid_lens(format!(
                "{lens_dimensions}-dimensional lens is not supported"
            )));
        }

        match config {
            LensConfig::Columns { columns } => {
                if columns.len() != lens_dimensions {
                    return Err(MapperError::invalid_lens(format!(
                        "{} columns selected for a {lens_dimensions}-dimensional lens",
                        columns.len()
                    )));
                }
                if let Some(column) = columns.iter().find(|&&c| c >= dimension) {
                    return Err(MapperError::invalid_lens(format!(
                        "column {column} does not exist in a {dimension}-dimensional feature space"
                    )));
                }
                Ok(Self::Columns(columns.iter().copied().collect()))
            }
            LensConfig::Pca => {
                if lens_dimensions > dimension {
                    return Err(MapperError::invalid_lens(format!(
                        "cannot extract {lens_dimensions} principal axes from a {dimension}-dimensional feature space"
                    )));
                }
                let center = column_means(vectors, dimension);
                let covariance = covariance(vectors, &center);
                let mut eigen = symmetric_eigen(covariance);
                eigen.sort_by(|(a, _), (b, _)| b.total_cmp(a));
                let axes: ArrayVec<Vec<f64>, MAX_LENS_DIMENSIONS> = eigen
                    .into_iter()
                    .take(lens_dimensions)
                    .map(|(_, axis)| canonical_sign(axis))
                    .collect();
                log::debug!("fitted PCA lens with center {center:?} and axes {axes:?}");
                Ok(Self::Linear { center, axes })
            }
        }
    }

    /// Dimensionality of the produced coordinates.
    #[must_use]
    pub fn dimensions(&self) -> usize {
        match self {
            Self::Columns(columns) => columns.len(),
            Self::Linear { axes, .. } => axes.len(),
        }
    }

    /// Projects one feature vector.
    #[must_use]
    pub fn project(&self, features: &[f64]) -> LensCoordinate {
        match self {
            Self::Columns(columns) => columns.iter().map(|&c| features[c]).collect(),
            Self::Linear { center, axes } => axes
                .iter()
                .map(|axis| {
                    features
                        .iter()
                        .zip(center)
                        .zip(axis)
                        .map(|((x, c), a)| (x - c) * a)
                        .sum()
                })
                .collect(),
        }
    }

    /// Projects every vector, preserving order.
    #[must_use]
    pub fn project_all(&self, vectors: &[Vec<f64>]) -> Vec<LensCoordinate> {
        vectors.iter().map(|v| self.project(v)).collect()
    }
}

#[expect(clippy::cast_precision_loss)]
fn column_means(vectors: &[Vec<f64>], dimension: usize) -> Vec<f64> {
    let n = vectors.len().max(1) as f64;
    (0..dimension)
        .map(|d| vectors.iter().map(|v| v[d]).sum::<f64>() / n)
        .collect()
}

#[expect(clippy::cast_precision_loss)]
fn covariance(vectors: &[Vec<f64>], center: &[f64]) -> DMatrix<f64> {
    let dimension = center.len();
    let n = vectors.len().max(1) as f64;
    let centered = DMatrix::from_fn(vectors.len(), dimension, |row, col| {
        vectors[row][col] - center[col]
    });
    (centered.transpose() * &centered) / n
}

/// Eigen-decomposition of a symmetric matrix.
///
/// Returns `(eigenvalue, unit eigenvector)` pairs in the solver's column order.
fn symmetric_eigen(matrix: DMatrix<f64>) -> Vec<(f64, Vec<f64>)> {
    let eigen = SymmetricEigen::new(matrix);
    eigen
        .eigenvalues
        .iter()
        .zip(eigen.eigenvectors.column_iter())
        .map(|(&value, vector)| (value, vector.iter().copied().collect()))
        .collect()
}

/// Flips `axis` so that its largest-magnitude component (first on ties) is positive.
fn canonical_sign(mut axis: Vec<f64>) -> Vec<f64> {
    let pivot = axis
        .iter()
        .enumerate()
        .fold((0, 0.0_f64), |(best, best_abs), (i, x)| {
            if x.abs() > best_abs { (i, x.abs()) } else { (best, best_abs) }
        })
        .0;
    if axis.get(pivot).is_some_and(|x| *x < 0.0) {
        for x in &mut axis {
            *x = -*x;
        }
    }
    axis
}
