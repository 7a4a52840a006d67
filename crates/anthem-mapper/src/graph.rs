//! The Mapper graph: one node per cluster, one weighted edge per intersecting pair
//!
//! Edges are found through an inverted index from entity to the nodes containing it,
//! so the work is proportional to the total number of memberships rather than to the
//! square of the cluster count. The weight of an edge is the number of entities the
//! two clusters share.

use std::collections::BTreeMap;

use anthem_stats::descriptive::DescriptiveStats;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    cluster::{Cluster, ClusterId},
    feature_space::{EntityId, EntityIndex, FeatureSpace},
};

/// Position of a node in [`MapperGraph::nodes`].
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
#[display("node{_0}")]
#[serde(transparent)]
pub struct NodeId(pub usize);

/// Aggregate display statistics over a node's members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeStats {
    pub size: usize,
    pub min_win_percentage: f64,
    pub mean_win_percentage: f64,
    pub max_win_percentage: f64,
    pub mean_spirit_score: f64,
    /// Mean of each raw feature dimension, in [`MapperGraph::feature_names`] order
    pub feature_means: Vec<f64>,
}

impl NodeStats {
    /// # Panics
    ///
    /// Panics if `members` is empty.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn compute(space: &FeatureSpace, members: &[EntityIndex]) -> Self {
        assert!(!members.is_empty(), "node without members");
        let entities = members.iter().map(|&i| space.entity(i));
        let win = DescriptiveStats::new(entities.clone().map(|e| e.win_percentage))
            .expect("members are non-empty");
        let mean_spirit_score =
            entities.clone().map(|e| e.spirit_score).sum::<f64>() / members.len() as f64;

        let mut feature_means = vec![0.0; space.dimension()];
        for entity in entities {
            for (sum, value) in feature_means.iter_mut().zip(&entity.features) {
                *sum += value;
            }
        }
        for mean in &mut feature_means {
            *mean /= members.len() as f64;
        }

        Self {
            size: members.len(),
            min_win_percentage: win.min,
            mean_win_percentage: win.mean,
            max_win_percentage: win.max,
            mean_spirit_score,
            feature_means,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapperNode {
    pub id: NodeId,
    /// The cluster this node was built from
    pub cluster: ClusterId,
    /// Member identifiers in ascending order
    pub members: Vec<EntityId>,
    pub stats: NodeStats,
}

impl MapperNode {
    /// Display name such as `cube3_cluster0`.
    #[must_use]
    pub fn name(&self) -> String {
        self.cluster.to_string()
    }
}

/// Undirected weighted edge, stored with `source < target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapperEdge {
    pub source: NodeId,
    pub target: NodeId,
    /// Number of shared members
    pub weight: usize,
}

/// Immutable node and edge set of one Mapper run.
///
/// Nodes are ordered by [`ClusterId`]; edges by `(source, target)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapperGraph {
    feature_names: Vec<String>,
    nodes: Vec<MapperNode>,
    edges: Vec<MapperEdge>,
}

impl MapperGraph {
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    #[must_use]
    pub fn nodes(&self) -> &[MapperNode] {
        &self.nodes
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> &MapperNode {
        &self.nodes[id.0]
    }

    #[must_use]
    pub fn edges(&self) -> &[MapperEdge] {
        &self.edges
    }

    /// Looks up the edge joining `a` and `b` in either orientation.
    #[must_use]
    pub fn edge_between(&self, a: NodeId, b: NodeId) -> Option<&MapperEdge> {
        let key = (a.min(b), a.max(b));
        self.edges
            .binary_search_by(|e| (e.source, e.target).cmp(&key))
            .ok()
            .map(|idx| &self.edges[idx])
    }

    /// Neighbor lists of every node, each ascending.
    #[must_use]
    pub fn adjacency(&self) -> Vec<Vec<NodeId>> {
        let mut adjacency = vec![vec![]; self.nodes.len()];
        for edge in &self.edges {
            adjacency[edge.source.0].push(edge.target);
            adjacency[edge.target.0].push(edge.source);
        }
        for neighbors in &mut adjacency {
            neighbors.sort_unstable();
        }
        adjacency
    }

    /// Neighbors of `node` in ascending order.
    #[must_use]
    pub fn neighbors(&self, node: NodeId) -> Vec<NodeId> {
        let mut neighbors = self
            .edges
            .iter()
            .filter_map(|e| {
                if e.source == node {
                    Some(e.target)
                } else if e.target == node {
                    Some(e.source)
                } else {
                    None
                }
            })
            .collect::<Vec<_>>();
        neighbors.sort_unstable();
        neighbors
    }

    #[must_use]
    pub fn degree(&self, node: NodeId) -> usize {
        self.edges
            .iter()
            .filter(|e| e.source == node || e.target == node)
            .count()
    }

    /// Maximal connected components, ordered by smallest node; nodes ascending.
    #[must_use]
    pub fn connected_components(&self) -> Vec<Vec<NodeId>> {
        let adjacency = self.adjacency();
        let mut visited = vec![false; self.nodes.len()];
        let mut components = vec![];
        for start in 0..self.nodes.len() {
            if visited[start] {
                continue;
            }
            visited[start] = true;
            let mut component = vec![NodeId(start)];
            let mut stack = vec![start];
            while let Some(current) = stack.pop() {
                for &NodeId(next) in &adjacency[current] {
                    if !visited[next] {
                        visited[next] = true;
                        component.push(NodeId(next));
                        stack.push(next);
                    }
                }
            }
            component.sort_unstable();
            components.push(component);
        }
        components
    }
}

/// Assembles a [`MapperGraph`] from clusters.
#[derive(Debug, Clone, Copy)]
pub struct MapperGraphBuilder<'a> {
    space: &'a FeatureSpace,
    parallel: bool,
}

impl<'a> MapperGraphBuilder<'a> {
    #[must_use]
    pub fn new(space: &'a FeatureSpace) -> Self {
        Self {
            space,
            parallel: false,
        }
    }

    /// Counts shared memberships on the rayon pool.
    #[must_use]
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Builds the graph; clusters are sorted by [`ClusterId`] first, so the input
    /// order does not matter.
    ///
    /// Clusters sharing no member with any other cluster become degree-0 nodes.
    #[must_use]
    pub fn build(&self, clusters: &[Cluster]) -> MapperGraph {
        let mut clusters = clusters.iter().collect::<Vec<_>>();
        clusters.sort_by_key(|c| c.id);

        let nodes = clusters
            .iter()
            .enumerate()
            .map(|(idx, cluster)| MapperNode {
                id: NodeId(idx),
                cluster: cluster.id,
                members: cluster
                    .members
                    .iter()
                    .map(|&i| self.space.entity(i).id.clone())
                    .collect(),
                stats: NodeStats::compute(self.space, &cluster.members),
            })
            .collect::<Vec<_>>();

        let mut containing = vec![vec![]; self.space.len()];
        for (idx, cluster) in clusters.iter().enumerate() {
            for &entity in &cluster.members {
                containing[entity].push(idx);
            }
        }

        let shared = if self.parallel {
            containing
                .par_iter()
                .fold(BTreeMap::new, |mut acc, nodes| {
                    count_pairs(&mut acc, nodes);
                    acc
                })
                .reduce(BTreeMap::new, |mut a, b| {
                    for (pair, count) in b {
                        *a.entry(pair).or_insert(0) += count;
                    }
                    a
                })
        } else {
            let mut acc = BTreeMap::new();
            for nodes in &containing {
                count_pairs(&mut acc, nodes);
            }
            acc
        };

        let edges = shared
            .into_iter()
            .map(|((source, target), weight)| MapperEdge {
                source: NodeId(source),
                target: NodeId(target),
                weight,
            })
            .collect::<Vec<_>>();

        log::debug!("built graph with {} nodes and {} edges", nodes.len(), edges.len());

        MapperGraph {
            feature_names: self.space.feature_names().to_vec(),
            nodes,
            edges,
        }
    }
}

/// Adds one shared membership for every pair of `nodes` (ascending, distinct).
fn count_pairs(acc: &mut BTreeMap<(usize, usize), usize>, nodes: &[usize]) {
    for (i, &a) in nodes.iter().enumerate() {
        for &b in &nodes[i + 1..] {
            *acc.entry((a, b)).or_insert(0) += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use super::*;
    use crate::{cluster::ClusterId, cover::CoverElementId, feature_space::EntityRecord};

    #[expect(clippy::cast_precision_loss)]
    fn space(n: usize) -> FeatureSpace {
        let records = (0..n)
            .map(|i| EntityRecord {
                id: format!("s{i:03}").into(),
                label: None,
                features: vec![i as f64, 1.0],
                win_percentage: 0.4 + 0.01 * i as f64,
                spirit_score: 5.0,
            })
            .collect();
        FeatureSpace::new(vec![], records).unwrap()
    }

    fn cluster(element: usize, rank: usize, members: &[usize]) -> Cluster {
        Cluster {
            id: ClusterId {
                element: CoverElementId(element),
                rank,
            },
            members: members.to_vec(),
            threshold: 1.0,
        }
    }

    fn naive_edges(clusters: &[Cluster]) -> Vec<(usize, usize, usize)> {
        let mut clusters = clusters.to_vec();
        clusters.sort_by_key(|c| c.id);
        let mut edges = vec![];
        for a in 0..clusters.len() {
            for b in a + 1..clusters.len() {
                let left = clusters[a].members.iter().collect::<BTreeSet<_>>();
                let shared = clusters[b]
                    .members
                    .iter()
                    .filter(|m| left.contains(m))
                    .count();
                if shared > 0 {
                    edges.push((a, b, shared));
                }
            }
        }
        edges
    }

    fn edge_triples(graph: &MapperGraph) -> Vec<(usize, usize, usize)> {
        graph
            .edges()
            .iter()
            .map(|e| (e.source.0, e.target.0, e.weight))
            .collect()
    }

    #[test]
    fn test_two_clusters_sharing_two_entities() {
        let space = space(5);
        let clusters = [cluster(0, 0, &[0, 1, 2, 3]), cluster(1, 0, &[2, 3, 4])];
        let graph = MapperGraphBuilder::new(&space).build(&clusters);
        assert_eq!(graph.nodes().len(), 2);
        assert_eq!(edge_triples(&graph), [(0, 1, 2)]);
    }

    #[test]
    fn test_isolated_clusters_are_kept() {
        let space = space(4);
        let clusters = [cluster(0, 0, &[0, 1]), cluster(1, 0, &[2]), cluster(1, 1, &[3])];
        let graph = MapperGraphBuilder::new(&space).build(&clusters);
        assert_eq!(graph.nodes().len(), 3);
        assert!(graph.edges().is_empty());
        assert_eq!(graph.degree(NodeId(2)), 0);
        assert_eq!(graph.connected_components().len(), 3);
    }

    #[test]
    fn test_node_stats() {
        let space = space(4);
        let graph = MapperGraphBuilder::new(&space).build(&[cluster(0, 0, &[1, 3])]);
        let node = &graph.nodes()[0];
        assert_eq!(node.name(), "cube0_cluster0");
        let expected: Vec<EntityId> = vec!["s001".into(), "s003".into()];
        assert_eq!(node.members, expected);
        assert_eq!(node.stats.size, 2);
        assert!((node.stats.min_win_percentage - 0.41).abs() < 1e-12);
        assert!((node.stats.max_win_percentage - 0.43).abs() < 1e-12);
        assert!((node.stats.mean_win_percentage - 0.42).abs() < 1e-12);
        assert_eq!(node.stats.mean_spirit_score, 5.0);
        assert_eq!(node.stats.feature_means, vec![2.0, 1.0]);
    }

    #[test]
    fn test_node_order_ignores_input_order() {
        let space = space(3);
        let forward = [cluster(0, 0, &[0, 1]), cluster(1, 0, &[1, 2])];
        let backward = [forward[1].clone(), forward[0].clone()];
        let builder = MapperGraphBuilder::new(&space);
        assert_eq!(builder.build(&forward), builder.build(&backward));
    }

    #[test]
    fn test_queries() {
        let space = space(6);
        let clusters = [
            cluster(0, 0, &[0, 1]),
            cluster(1, 0, &[1, 2]),
            cluster(2, 0, &[2, 3]),
            cluster(3, 0, &[4, 5]),
        ];
        let graph = MapperGraphBuilder::new(&space).build(&clusters);
        assert_eq!(graph.neighbors(NodeId(1)), [NodeId(0), NodeId(2)]);
        assert_eq!(graph.degree(NodeId(1)), 2);
        assert_eq!(graph.edge_between(NodeId(2), NodeId(1)).map(|e| e.weight), Some(1));
        assert!(graph.edge_between(NodeId(0), NodeId(2)).is_none());
        assert_eq!(
            graph.connected_components(),
            [vec![NodeId(0), NodeId(1), NodeId(2)], vec![NodeId(3)]]
        );
    }

    #[test]
    fn test_inverted_index_matches_naive_definition() {
        let mut rng = Pcg32::seed_from_u64(2024);
        let space = space(40);
        for round in 0..20 {
            let clusters = (0..rng.random_range(1..25))
                .map(|i| {
                    let mut members = (0..40)
                        .filter(|_| rng.random_bool(0.15))
                        .collect::<Vec<_>>();
                    if members.is_empty() {
                        members.push(rng.random_range(0..40));
                    }
                    cluster(i / 3, i % 3, &members)
                })
                .collect::<Vec<_>>();
            let sequential = MapperGraphBuilder::new(&space).build(&clusters);
            let parallel = MapperGraphBuilder::new(&space).parallel(true).build(&clusters);
            assert_eq!(edge_triples(&sequential), naive_edges(&clusters), "round {round}");
            assert_eq!(sequential, parallel, "round {round}");
            assert!(sequential.edges().iter().all(|e| e.source < e.target));
        }
    }

    #[test]
    fn test_graph_json_roundtrip() {
        let space = space(3);
        let graph = MapperGraphBuilder::new(&space)
            .build(&[cluster(0, 0, &[0, 1]), cluster(1, 0, &[1, 2])]);
        let json = serde_json::to_string(&graph).unwrap();
        assert!(json.contains("\"members\":[\"s000\",\"s001\"]"));
        let back: MapperGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(back.nodes().len(), graph.nodes().len());
        assert_eq!(back.edges(), graph.edges());
        assert_eq!(back.node(NodeId(1)).members, graph.node(NodeId(1)).members);
    }
}
