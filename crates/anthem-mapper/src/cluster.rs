//! Single-linkage clustering inside each cover element
//!
//! Two entities of the same element share a cluster iff they are connected by a chain
//! of pairwise distances no greater than the cut threshold. Pairs are processed in
//! ascending `(distance, i, j)` order (Kruskal), which makes the resulting merge tree
//! independent of floating-point ties.
//!
//! Clusters of one element are ranked by their smallest member, so identifiers are
//! reproducible across runs.

use anthem_stats::histogram::Histogram;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    config::{DistanceThreshold, MapperConfig, Metric},
    cover::{Cover, CoverElement, CoverElementId},
    feature_space::EntityIndex,
};

/// Identity of a cluster: the cover element it came from and its rank within it.
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
#[display("{element}_cluster{rank}")]
pub struct ClusterId {
    pub element: CoverElementId,
    pub rank: usize,
}

/// A non-empty set of entities from one cover element.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub id: ClusterId,
    /// Members in ascending entity index order
    pub members: Vec<EntityIndex>,
    /// Distance threshold actually applied to the element
    pub threshold: f64,
}

/// One edge of the single-linkage merge tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Merge {
    pub a: usize,
    pub b: usize,
    pub distance: f64,
}

/// Clusters the members of cover elements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinClusterer {
    metric: Metric,
    threshold: DistanceThreshold,
    auto_threshold_bins: usize,
}

impl BinClusterer {
    #[must_use]
    pub fn new(metric: Metric, threshold: DistanceThreshold, auto_threshold_bins: usize) -> Self {
        Self {
            metric,
            threshold,
            auto_threshold_bins,
        }
    }

    #[must_use]
    pub fn from_config(config: &MapperConfig) -> Self {
        Self::new(
            config.metric,
            config.cluster_distance_threshold,
            config.auto_threshold_bins,
        )
    }

    /// Groups `points` into single-linkage clusters.
    ///
    /// Returns local point indices per cluster together with the applied threshold.
    /// Groups are ordered by their smallest index and each group is ascending.
    ///
    /// # Examples
    ///
    /// ```
    /// use anthem_mapper::cluster::BinClusterer;
    /// use anthem_mapper::config::{DistanceThreshold, Metric};
    ///
    /// let clusterer = BinClusterer::new(Metric::Euclidean, DistanceThreshold::Fixed(1.5), 10);
    /// let points = [vec![0.0], vec![1.0], vec![5.0], vec![2.0]];
    /// let (groups, _) = clusterer.cluster_points(&points);
    /// assert_eq!(groups, vec![vec![0, 1, 3], vec![2]]);
    /// ```
    #[must_use]
    pub fn cluster_points<P>(&self, points: &[P]) -> (Vec<Vec<usize>>, f64)
    where
        P: AsRef<[f64]>,
    {
        let merges = merge_tree(points, self.metric);
        let threshold = match self.threshold {
            DistanceThreshold::Fixed(threshold) => threshold,
            DistanceThreshold::Auto => auto_threshold(&merges, self.auto_threshold_bins),
        };

        let mut components = UnionFind::new(points.len());
        for merge in merges.iter().take_while(|m| m.distance <= threshold) {
            components.union(merge.a, merge.b);
        }
        (components.groups(), threshold)
    }

    /// Clusters the members of one cover element.
    ///
    /// An empty element yields no clusters.
    #[must_use]
    pub fn cluster_element(&self, element: &CoverElement, vectors: &[Vec<f64>]) -> Vec<Cluster> {
        let points = element
            .members
            .iter()
            .map(|&entity| vectors[entity].as_slice())
            .collect::<Vec<_>>();
        let (groups, threshold) = self.cluster_points(&points);
        log::debug!(
            "{}: {} members, {} clusters at threshold {threshold}",
            element.id,
            element.members.len(),
            groups.len()
        );
        groups
            .into_iter()
            .enumerate()
            .map(|(rank, group)| Cluster {
                id: ClusterId {
                    element: element.id,
                    rank,
                },
                members: group.into_iter().map(|i| element.members[i]).collect(),
                threshold,
            })
            .collect()
    }

    /// Clusters every occupied element of `cover`; the result is ordered by [`ClusterId`].
    ///
    /// Elements are independent, so with `parallel` set they are processed on the
    /// rayon thread pool. The output is identical either way.
    #[must_use]
    pub fn cluster_cover(&self, cover: &Cover, vectors: &[Vec<f64>], parallel: bool) -> Vec<Cluster> {
        let occupied = cover.occupied().collect::<Vec<_>>();
        let per_element: Vec<Vec<Cluster>> = if parallel {
            occupied
                .par_iter()
                .map(|element| self.cluster_element(element, vectors))
                .collect()
        } else {
            occupied
                .iter()
                .map(|element| self.cluster_element(element, vectors))
                .collect()
        };
        let mut clusters = per_element.into_iter().flatten().collect::<Vec<_>>();
        clusters.sort_by_key(|c| c.id);
        clusters
    }
}

/// Minimum spanning forest of the complete distance graph over `points`.
///
/// Merges are returned in ascending `(distance, a, b)` order with `a < b`; cutting the
/// sequence at any threshold reproduces single-linkage clustering at that threshold.
#[must_use]
pub fn merge_tree<P>(points: &[P], metric: Metric) -> Vec<Merge>
where
    P: AsRef<[f64]>,
{
    let n = points.len();
    let mut pairs = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for a in 0..n {
        for b in a + 1..n {
            pairs.push(Merge {
                a,
                b,
                distance: metric.distance(points[a].as_ref(), points[b].as_ref()),
            });
        }
    }
    pairs.sort_by(|x, y| {
        x.distance
            .total_cmp(&y.distance)
            .then(x.a.cmp(&y.a))
            .then(x.b.cmp(&y.b))
    });

    let mut components = UnionFind::new(n);
    pairs
        .into_iter()
        .filter(|pair| components.union(pair.a, pair.b))
        .collect()
}

/// Picks a cut threshold from the merge heights.
///
/// The heights are binned into `bins` equal-width bins; the cut is placed at the lower
/// edge of the first empty bin. Without an empty bin (including a single merge height
/// or none at all) nothing separates the heights and the threshold is infinite,
/// yielding one cluster.
///
/// # Examples
///
/// ```
/// use anthem_mapper::cluster::{auto_threshold, Merge};
///
/// let merges = [0.1, 0.2, 0.25, 0.3, 2.0]
///     .into_iter()
///     .map(|distance| Merge { a: 0, b: 1, distance })
///     .collect::<Vec<_>>();
/// let threshold = auto_threshold(&merges, 4);
/// assert!(threshold > 0.3 && threshold < 2.0);
/// ```
#[must_use]
pub fn auto_threshold(merges: &[Merge], bins: usize) -> f64 {
    let histogram = Histogram::uniform(merges.iter().map(|m| m.distance), bins);
    histogram
        .first_empty_bin()
        .map_or(f64::INFINITY, |idx| histogram.bins[idx].range.start)
}

#[derive(Debug)]
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Returns `true` if `a` and `b` were in different sets.
    fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        // The smaller index stays the root.
        let (root, child) = if ra < rb { (ra, rb) } else { (rb, ra) };
        self.parent[child] = root;
        true
    }

    /// Sets ordered by smallest member, members ascending.
    fn groups(&mut self) -> Vec<Vec<usize>> {
        let mut slot_of_root = vec![usize::MAX; self.parent.len()];
        let mut groups: Vec<Vec<usize>> = vec![];
        for x in 0..self.parent.len() {
            let root = self.find(x);
            if slot_of_root[root] == usize::MAX {
                slot_of_root[root] = groups.len();
                groups.push(vec![]);
            }
            groups[slot_of_root[root]].push(x);
        }
        groups
    }
}
