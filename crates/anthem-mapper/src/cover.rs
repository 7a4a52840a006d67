//! Overlapping cover of the lens range
//!
//! Each lens dimension `[min, max]` is tiled by `resolution` intervals of width
//!
//! ```text
//! w = range / (resolution - resolution * overlap + overlap)
//! ```
//!
//! placed `w * (1 - overlap)` apart, so consecutive intervals share `overlap * w`.
//! The first interval starts at `min`; the last one ends exactly at `max` and is closed
//! so the maximum is covered. For a 2-D lens the cover is the Cartesian product of
//! the two interval sequences, indexed in row-major order.
//!
//! ```text
//! resolution = 3, overlap = 0.5
//!
//! min                                   max
//!  |-----------|                         |
//!  |     |-----------|                   |
//!  |           |     |-----------|       |
//!  |                 |     |-------------|
//! ```
//!
//! A lens dimension with zero range collapses to a single interval holding every
//! entity. This is reported as a [`CoverDiagnostic`], not as an error.

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

use crate::{
    feature_space::EntityIndex,
    lens::{LensCoordinate, MAX_LENS_DIMENSIONS},
};

/// Identity of a cover element: its row-major position in the cover grid.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[display("cube{_0}")]
#[serde(transparent)]
pub struct CoverElementId(pub usize);

/// A bounded interval of one lens dimension.
///
/// Half-open `[low, high)` unless `closed_high` is set, which only happens for the
/// last interval of a dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub low: f64,
    pub high: f64,
    pub closed_high: bool,
}

impl Interval {
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && (value < self.high || (self.closed_high && value <= self.high))
    }
}

/// Observed `[min, max]` of every lens dimension, computed once per run.
#[derive(Debug, Clone, PartialEq)]
pub struct LensRange {
    bounds: ArrayVec<(f64, f64), MAX_LENS_DIMENSIONS>,
}

impl LensRange {
    /// Computes the range of `lens`.
    ///
    /// # Panics
    ///
    /// Panics if `lens` is empty or its coordinates differ in dimensionality.
    #[must_use]
    pub fn of(lens: &[LensCoordinate]) -> Self {
        assert!(!lens.is_empty(), "lens range of an empty dataset");
        let dimensions = lens[0].len();
        assert!(
            lens.iter().all(|c| c.len() == dimensions),
            "lens coordinates differ in dimensionality"
        );
        let bounds = (0..dimensions)
            .map(|d| {
                lens.iter().map(|c| c[d]).fold(
                    (f64::INFINITY, f64::NEG_INFINITY),
                    |(lo, hi), v| (lo.min(v), hi.max(v)),
                )
            })
            .collect();
        Self { bounds }
    }

    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.bounds.len()
    }

    /// `(min, max)` of dimension `dimension`.
    #[must_use]
    pub fn bounds(&self, dimension: usize) -> (f64, f64) {
        self.bounds[dimension]
    }
}

/// Non-fatal observation made while building a cover.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CoverDiagnostic {
    /// Every entity shares `value` in lens dimension `dimension`
    DegenerateDimension { dimension: usize, value: f64 },
}

/// One region of the cover and the entities whose lens coordinate it contains.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverElement {
    pub id: CoverElementId,
    /// Interval index per lens dimension
    pub grid: ArrayVec<usize, MAX_LENS_DIMENSIONS>,
    /// Interval per lens dimension
    pub bounds: ArrayVec<Interval, MAX_LENS_DIMENSIONS>,
    /// Member entities in ascending index order
    pub members: Vec<EntityIndex>,
}

impl CoverElement {
    #[must_use]
    pub fn contains(&self, coordinate: &LensCoordinate) -> bool {
        self.bounds
            .iter()
            .zip(coordinate)
            .all(|(interval, &value)| interval.contains(value))
    }
}

/// The complete cover, including empty elements, in id order.
#[derive(Debug, Clone, PartialEq)]
pub struct Cover {
    elements: Vec<CoverElement>,
    diagnostics: Vec<CoverDiagnostic>,
}

impl Cover {
    #[must_use]
    pub fn elements(&self) -> &[CoverElement] {
        &self.elements
    }

    #[must_use]
    pub fn diagnostics(&self) -> &[CoverDiagnostic] {
        &self.diagnostics
    }

    /// Elements holding at least one entity.
    pub fn occupied(&self) -> impl Iterator<Item = &CoverElement> {
        self.elements.iter().filter(|e| !e.members.is_empty())
    }
}

/// Builds overlapping covers from a resolution and overlap fraction.
///
/// # Examples
///
/// ```
/// use anthem_mapper::cover::{CoverBuilder, LensRange};
/// use anthem_mapper::lens::LensCoordinate;
///
/// let lens: Vec<LensCoordinate> = [0.0, 0.5, 1.0]
///     .into_iter()
///     .map(|x| [x].into_iter().collect())
///     .collect();
/// let cover = CoverBuilder::new(2, 0.5).build(&LensRange::of(&lens), &lens);
///
/// // Width 2/3, step 1/3: [0, 2/3) and [1/3, 1]; the midpoint lies in both.
/// assert_eq!(cover.elements()[0].members, vec![0, 1]);
/// assert_eq!(cover.elements()[1].members, vec![1, 2]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverBuilder {
    resolution: usize,
    overlap_fraction: f64,
}

impl CoverBuilder {
    /// `resolution` and `overlap_fraction` are assumed to be validated by
    /// [`MapperConfig::validate`](crate::config::MapperConfig::validate).
    #[must_use]
    pub fn new(resolution: usize, overlap_fraction: f64) -> Self {
        debug_assert!(resolution >= 1);
        debug_assert!((0.0..1.0).contains(&overlap_fraction));
        Self {
            resolution,
            overlap_fraction,
        }
    }

    /// Tiles `range` and assigns every coordinate of `lens` to each element containing it.
    #[must_use]
    pub fn build(&self, range: &LensRange, lens: &[LensCoordinate]) -> Cover {
        let mut diagnostics = vec![];
        let per_dimension = (0..range.dimensions())
            .map(|dimension| {
                let (min, max) = range.bounds(dimension);
                if max > min {
                    self.intervals(min, max)
                } else {
                    log::warn!(
                        "lens dimension {dimension} has zero range (all values are {min}); \
                         collapsing it to a single cover interval"
                    );
                    diagnostics.push(CoverDiagnostic::DegenerateDimension {
                        dimension,
                        value: min,
                    });
                    vec![Interval {
                        low: min,
                        high: max,
                        closed_high: true,
                    }]
                }
            })
            .collect::<ArrayVec<_, MAX_LENS_DIMENSIONS>>();

        let shape = per_dimension
            .iter()
            .map(Vec::len)
            .collect::<ArrayVec<_, MAX_LENS_DIMENSIONS>>();
        let mut elements = grid_positions(&shape)
            .enumerate()
            .map(|(id, grid)| CoverElement {
                id: CoverElementId(id),
                bounds: grid
                    .iter()
                    .zip(&per_dimension)
                    .map(|(&i, intervals)| intervals[i])
                    .collect(),
                grid,
                members: vec![],
            })
            .collect::<Vec<_>>();

        for (entity, coordinate) in lens.iter().enumerate() {
            let hits = per_dimension
                .iter()
                .zip(coordinate)
                .map(|(intervals, &value)| {
                    intervals
                        .iter()
                        .enumerate()
                        .filter(|(_, interval)| interval.contains(value))
                        .map(|(i, _)| i)
                        .collect::<Vec<_>>()
                })
                .collect::<ArrayVec<_, MAX_LENS_DIMENSIONS>>();
            let hit_shape = hits
                .iter()
                .map(Vec::len)
                .collect::<ArrayVec<_, MAX_LENS_DIMENSIONS>>();
            for pick in grid_positions(&hit_shape) {
                let flat = pick
                    .iter()
                    .zip(&hits)
                    .zip(&shape)
                    .fold(0, |acc, ((&p, hit), &size)| acc * size + hit[p]);
                elements[flat].members.push(entity);
            }
        }

        log::debug!(
            "built cover with {} elements ({} occupied)",
            elements.len(),
            elements.iter().filter(|e| !e.members.is_empty()).count()
        );

        Cover {
            elements,
            diagnostics,
        }
    }

    #[expect(clippy::cast_precision_loss)]
    fn intervals(&self, min: f64, max: f64) -> Vec<Interval> {
        let resolution = self.resolution as f64;
        let overlap = self.overlap_fraction;
        let width = (max - min) / (resolution - resolution * overlap + overlap);
        let step = width * (1.0 - overlap);
        let low_at = |i: usize| min + step * i as f64;

        (0..self.resolution)
            .map(|i| {
                let low = low_at(i);
                let last = i + 1 == self.resolution;
                // Never leave a rounding gap before the next interval.
                let high = if last {
                    max
                } else {
                    (low + width).max(low_at(i + 1))
                };
                Interval {
                    low,
                    high,
                    closed_high: last,
                }
            })
            .collect()
    }
}

/// Iterates every index tuple of a grid with the given shape in row-major order.
fn grid_positions(
    shape: &[usize],
) -> impl Iterator<Item = ArrayVec<usize, MAX_LENS_DIMENSIONS>> + use<> {
    let shape = shape.iter().copied().collect::<ArrayVec<usize, MAX_LENS_DIMENSIONS>>();
    let total = shape.iter().product::<usize>();
    (0..total).map(move |mut flat| {
        let mut position = ArrayVec::<usize, MAX_LENS_DIMENSIONS>::new();
        for &size in shape.iter().rev() {
            position.push(flat % size);
            flat /= size;
        }
        position.reverse();
        position
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lens_1d(values: &[f64]) -> Vec<LensCoordinate> {
        values.iter().map(|&x| [x].into_iter().collect()).collect()
    }

    fn lens_2d(values: &[(f64, f64)]) -> Vec<LensCoordinate> {
        values.iter().map(|&(x, y)| [x, y].into_iter().collect()).collect()
    }

    fn build(resolution: usize, overlap: f64, lens: &[LensCoordinate]) -> Cover {
        CoverBuilder::new(resolution, overlap).build(&LensRange::of(lens), lens)
    }

    #[test]
    fn test_interval_tiling_widths() {
        let builder = CoverBuilder::new(5, 0.5);
        let intervals = builder.intervals(0.0, 3.0);
        // w = 3 / (5 - 2.5 + 0.5) = 1, step = 0.5
        assert_eq!(intervals.len(), 5);
        for (i, interval) in intervals.iter().enumerate() {
            let expected_low = 0.5 * i as f64;
            assert!((interval.low - expected_low).abs() < 1e-12);
            assert!((interval.high - (expected_low + 1.0)).abs() < 1e-12);
        }
        assert_eq!(intervals[4].high, 3.0);
        assert!(intervals[4].closed_high);
        assert!(!intervals[3].closed_high);
    }

    #[test]
    fn test_zero_overlap_has_no_gaps() {
        let builder = CoverBuilder::new(7, 0.0);
        let intervals = builder.intervals(0.1, 0.8);
        for pair in intervals.windows(2) {
            assert!(pair[0].high >= pair[1].low);
        }
    }

    #[test]
    fn test_every_entity_is_covered() {
        let values = (0..50)
            .map(|i| (f64::from(i) * 0.37).sin() * 4.0)
            .collect::<Vec<_>>();
        let lens = lens_1d(&values);
        for (resolution, overlap) in [(1, 0.0), (3, 0.0), (4, 0.25), (10, 0.6), (6, 0.9)] {
            let cover = build(resolution, overlap, &lens);
            for entity in 0..lens.len() {
                assert!(
                    cover.elements().iter().any(|e| e.members.contains(&entity)),
                    "entity {entity} uncovered at resolution {resolution}, overlap {overlap}"
                );
            }
        }
    }

    #[test]
    fn test_membership_matches_bounds() {
        let lens = lens_2d(&[(0.0, 0.0), (0.4, 1.0), (1.0, 0.5), (0.55, 0.45), (0.9, 0.1)]);
        let cover = build(3, 0.3, &lens);
        for element in cover.elements() {
            for (entity, coordinate) in lens.iter().enumerate() {
                assert_eq!(element.members.contains(&entity), element.contains(coordinate));
            }
        }
    }

    #[test]
    fn test_overlap_region_belongs_to_two_elements() {
        // [0, 2/3) and [1/3, 1]
        let lens = lens_1d(&[0.0, 0.5, 1.0]);
        let cover = build(2, 0.5, &lens);
        let containing = cover
            .elements()
            .iter()
            .filter(|e| e.members.contains(&1))
            .count();
        assert_eq!(containing, 2);
    }

    #[test]
    fn test_identical_lens_values_collapse_to_one_element() {
        let lens = lens_1d(&[0.5; 5]);
        let cover = build(1, 0.0, &lens);
        assert_eq!(cover.elements().len(), 1);
        assert_eq!(cover.elements()[0].members, vec![0, 1, 2, 3, 4]);
        assert_eq!(
            cover.diagnostics(),
            &[CoverDiagnostic::DegenerateDimension {
                dimension: 0,
                value: 0.5
            }]
        );

        // Degeneracy ignores the requested resolution.
        let cover = build(4, 0.5, &lens);
        assert_eq!(cover.elements().len(), 1);
    }

    #[test]
    fn test_2d_grid_is_row_major() {
        let lens = lens_2d(&[(0.0, 0.0), (1.0, 1.0)]);
        let cover = build(2, 0.0, &lens);
        let grids = cover
            .elements()
            .iter()
            .map(|e| (e.id.0, e.grid.to_vec()))
            .collect::<Vec<_>>();
        assert_eq!(
            grids,
            [
                (0, vec![0, 0]),
                (1, vec![0, 1]),
                (2, vec![1, 0]),
                (3, vec![1, 1])
            ]
        );
        assert_eq!(cover.elements()[0].members, vec![0]);
        assert_eq!(cover.elements()[3].members, vec![1]);
        assert_eq!(cover.occupied().count(), 2);
    }

    #[test]
    fn test_2d_corner_belongs_to_four_elements() {
        let lens = lens_2d(&[(0.0, 0.0), (0.5, 0.5), (1.0, 1.0)]);
        let cover = build(2, 0.5, &lens);
        let containing = cover
            .elements()
            .iter()
            .filter(|e| e.members.contains(&1))
            .count();
        assert_eq!(containing, 4);
    }

    #[test]
    fn test_one_degenerate_dimension_in_2d() {
        let lens = lens_2d(&[(0.0, 3.0), (1.0, 3.0), (2.0, 3.0)]);
        let cover = build(3, 0.0, &lens);
        assert_eq!(cover.elements().len(), 3);
        assert_eq!(cover.diagnostics().len(), 1);
        assert!(cover.elements().iter().all(|e| e.members.len() == 1));
    }
}
