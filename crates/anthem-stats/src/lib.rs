//! Statistical helpers shared by the anthem workspace.
//!
//! The crate is intentionally small:
//!
//! - **Descriptive statistics**: min, max, mean, median, variance and standard deviation
//!   of a set of `f64` values
//! - **Histograms**: equal-width frequency distributions with gap detection, used by the
//!   Mapper clusterer to pick a cut height from single-linkage merge distances
//!
//! # Modules
//!
//! - [`descriptive`]: Descriptive statistics for summarizing datasets
//! - [`histogram`]: Equal-width histograms and empty-bin search
//!
//! # Examples
//!
//! ## Computing descriptive statistics
//!
//! ```
//! use anthem_stats::descriptive::DescriptiveStats;
//!
//! let stats = DescriptiveStats::new([0.735, 0.732, 0.421]).unwrap();
//! assert_eq!(stats.count, 3);
//! assert_eq!(stats.max, 0.735);
//! ```
//!
//! ## Finding a gap in a distribution
//!
//! ```
//! use anthem_stats::histogram::Histogram;
//!
//! let values = [0.1, 0.2, 0.25, 0.3, 2.0];
//! let histogram = Histogram::uniform(values, 4);
//! assert_eq!(histogram.first_empty_bin(), Some(1));
//! ```

pub mod descriptive;
pub mod histogram;
