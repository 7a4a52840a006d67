use std::ops::Range;

/// An equal-width histogram of a dataset.
///
/// The observed range `[min, max]` is split into `num_bins` bins of identical width.
/// Every bin is half-open except the last one, which also contains `max`, so every
/// input value lands in exactly one bin.
#[derive(Debug, Clone)]
pub struct Histogram {
    /// The bins in ascending order of their ranges.
    pub bins: Vec<HistogramBin>,
}

/// A single bin in a histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    /// The range of values covered by this bin (inclusive start, exclusive end,
    /// except for the last bin whose end is inclusive).
    pub range: Range<f64>,
    /// The number of values that fall within this bin.
    pub count: u64,
}

impl Histogram {
    /// Creates an equal-width histogram over the observed range of `values`.
    ///
    /// When every value is identical (zero range) the histogram collapses to a single
    /// bin holding all values, regardless of `num_bins`.
    ///
    /// # Returns
    ///
    /// An empty histogram if `values` is empty or `num_bins` is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// # use anthem_stats::histogram::Histogram;
    /// let histogram = Histogram::uniform([0.0, 1.0, 2.0, 3.0], 2);
    /// assert_eq!(histogram.bins.len(), 2);
    /// assert_eq!(histogram.bins[0].count, 2);
    /// assert_eq!(histogram.bins[1].count, 2);
    /// ```
    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_sign_loss,
        clippy::cast_possible_truncation
    )]
    #[must_use]
    pub fn uniform<I>(values: I, num_bins: usize) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let values = values.into_iter().collect::<Vec<_>>();
        if values.is_empty() || num_bins == 0 {
            return Self { bins: vec![] };
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = max - min;

        if range <= 0.0 {
            return Self {
                bins: vec![HistogramBin {
                    range: min..max,
                    count: values.len() as u64,
                }],
            };
        }

        // Bin edges are recomputed from the index to avoid accumulated drift.
        let edge = |idx: usize| {
            if idx == num_bins {
                max
            } else {
                min + range * (idx as f64) / (num_bins as f64)
            }
        };
        let mut bins = (0..num_bins)
            .map(|idx| HistogramBin {
                range: edge(idx)..edge(idx + 1),
                count: 0,
            })
            .collect::<Vec<_>>();

        for value in values {
            let position = (value - min) / range * num_bins as f64;
            let idx = (position.floor() as usize).min(num_bins - 1);
            bins[idx].count += 1;
        }

        Self { bins }
    }

    /// Returns the index of the lowest bin that holds no values.
    ///
    /// The first and last bins of a non-degenerate histogram always hold the
    /// minimum and maximum, so a returned index lies strictly inside the range.
    ///
    /// # Examples
    ///
    /// ```
    /// # use anthem_stats::histogram::Histogram;
    /// let histogram = Histogram::uniform([1.0, 1.1, 1.2, 5.0], 4);
    /// assert_eq!(histogram.first_empty_bin(), Some(1));
    ///
    /// let dense = Histogram::uniform([1.0, 2.0, 3.0, 4.0], 4);
    /// assert_eq!(dense.first_empty_bin(), None);
    /// ```
    #[must_use]
    pub fn first_empty_bin(&self) -> Option<usize> {
        self.bins.iter().position(|bin| bin.count == 0)
    }

    /// Total number of values counted by the histogram.
    #[must_use]
    pub fn total_count(&self) -> u64 {
        self.bins.iter().map(|bin| bin.count).sum()
    }
}
