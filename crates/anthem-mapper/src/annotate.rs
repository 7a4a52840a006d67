//! Post-hoc labeling of the Mapper graph
//!
//! Two kinds of structure are reported, neither of which changes the graph:
//!
//! - **Dead zones**: connected components with fewer nodes than the configured minimum,
//!   and every degree-0 node regardless of that minimum.
//! - **Winning manifold**: a simple cycle whose nodes all have a mean win percentage and
//!   a mean spirit score strictly above the configured thresholds.
//!
//! Cycles are taken from the fundamental cycle basis of the induced subgraph on the
//! qualifying nodes: a depth-first spanning forest is built (roots and neighbors in
//! ascending node order) and each non-tree edge closes exactly one cycle with the tree
//! path between its endpoints. Among cycles that are long enough, the longest wins; ties
//! go to the lowest mean node id, then to the lexicographically smallest node set.

use serde::{Deserialize, Serialize};

use crate::{
    config::MapperConfig,
    graph::{MapperGraph, NodeId},
};

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
#[serde(rename_all = "snake_case")]
pub enum NodeLabel {
    #[display("manifold_member")]
    ManifoldMember,
    #[display("dead_zone")]
    DeadZone,
}

/// A qualifying cycle, listed in traversal order starting from its smallest node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinningManifold {
    pub nodes: Vec<NodeId>,
    pub mean_win_percentage: f64,
    pub mean_spirit_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeadZoneReason {
    /// A single node without edges
    Isolated,
    /// A component with fewer nodes than `dead_zone_min_size`
    SmallComponent { size: usize },
}

/// One dead connected component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadZone {
    pub nodes: Vec<NodeId>,
    pub reason: DeadZoneReason,
}

/// A Mapper graph together with its annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedGraph {
    pub graph: MapperGraph,
    /// Labels per node, indexed by [`NodeId`]
    pub node_labels: Vec<Vec<NodeLabel>>,
    pub manifold: Option<WinningManifold>,
    pub dead_zones: Vec<DeadZone>,
}

impl AnnotatedGraph {
    #[must_use]
    pub fn labels(&self, node: NodeId) -> &[NodeLabel] {
        &self.node_labels[node.0]
    }

    #[must_use]
    pub fn has_label(&self, node: NodeId, label: NodeLabel) -> bool {
        self.labels(node).contains(&label)
    }
}

/// Finds the winning manifold and the dead zones of a graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TopologyAnnotator {
    pub dead_zone_min_size: usize,
    pub min_cycle_length: usize,
    pub win_threshold: f64,
    pub spirit_threshold: f64,
}

impl TopologyAnnotator {
    #[must_use]
    pub fn from_config(config: &MapperConfig) -> Self {
        Self {
            dead_zone_min_size: config.dead_zone_min_size,
            min_cycle_length: config.manifold_min_cycle_length,
            win_threshold: config.manifold_win_threshold,
            spirit_threshold: config.manifold_spirit_threshold,
        }
    }

    #[must_use]
    pub fn annotate(&self, graph: MapperGraph) -> AnnotatedGraph {
        let dead_zones = self.dead_zones(&graph);
        let manifold = self.winning_manifold(&graph);

        let mut node_labels = vec![vec![]; graph.nodes().len()];
        if let Some(manifold) = &manifold {
            for node in &manifold.nodes {
                node_labels[node.0].push(NodeLabel::ManifoldMember);
            }
        }
        for zone in &dead_zones {
            for node in &zone.nodes {
                node_labels[node.0].push(NodeLabel::DeadZone);
            }
        }

        match &manifold {
            Some(m) => log::info!(
                "winning manifold of {} nodes (mean win {:.3}, mean spirit {:.2}); {} dead zones",
                m.nodes.len(),
                m.mean_win_percentage,
                m.mean_spirit_score,
                dead_zones.len()
            ),
            None => log::info!("no winning manifold; {} dead zones", dead_zones.len()),
        }

        AnnotatedGraph {
            graph,
            node_labels,
            manifold,
            dead_zones,
        }
    }

    /// Components that are isolated nodes or smaller than `dead_zone_min_size`.
    #[must_use]
    pub fn dead_zones(&self, graph: &MapperGraph) -> Vec<DeadZone> {
        graph
            .connected_components()
            .into_iter()
            .filter_map(|nodes| {
                let reason = if nodes.len() == 1 {
                    DeadZoneReason::Isolated
                } else if nodes.len() < self.dead_zone_min_size {
                    DeadZoneReason::SmallComponent { size: nodes.len() }
                } else {
                    return None;
                };
                Some(DeadZone { nodes, reason })
            })
            .collect()
    }

    fn qualifies(&self, graph: &MapperGraph, node: NodeId) -> bool {
        let stats = &graph.node(node).stats;
        stats.mean_win_percentage > self.win_threshold
            && stats.mean_spirit_score > self.spirit_threshold
    }

    /// The best qualifying fundamental cycle, if any.
    #[must_use]
    pub fn winning_manifold(&self, graph: &MapperGraph) -> Option<WinningManifold> {
        let qualifying = (0..graph.nodes().len())
            .map(|i| self.qualifies(graph, NodeId(i)))
            .collect::<Vec<_>>();
        let mut adjacency = graph.adjacency();
        for (node, neighbors) in adjacency.iter_mut().enumerate() {
            if qualifying[node] {
                neighbors.retain(|n| qualifying[n.0]);
            } else {
                neighbors.clear();
            }
        }

        let forest = SpanningForest::depth_first(&adjacency, &qualifying);
        let best = graph
            .edges()
            .iter()
            .filter(|e| qualifying[e.source.0] && qualifying[e.target.0])
            .filter(|e| !forest.is_tree_edge(e.source.0, e.target.0))
            .map(|e| forest.cycle_through(e.source.0, e.target.0))
            .filter(|cycle| cycle.len() >= self.min_cycle_length)
            .min_by(|a, b| {
                b.len()
                    .cmp(&a.len())
                    .then_with(|| a.iter().sum::<usize>().cmp(&b.iter().sum::<usize>()))
                    .then_with(|| sorted(a).cmp(&sorted(b)))
            })?;

        let nodes = normalize_rotation(best)
            .into_iter()
            .map(NodeId)
            .collect::<Vec<_>>();
        #[expect(clippy::cast_precision_loss)]
        let len = nodes.len() as f64;
        let mean_win_percentage = nodes
            .iter()
            .map(|&n| graph.node(n).stats.mean_win_percentage)
            .sum::<f64>()
            / len;
        let mean_spirit_score = nodes
            .iter()
            .map(|&n| graph.node(n).stats.mean_spirit_score)
            .sum::<f64>()
            / len;
        Some(WinningManifold {
            nodes,
            mean_win_percentage,
            mean_spirit_score,
        })
    }
}

#[derive(Debug)]
struct SpanningForest {
    parent: Vec<Option<usize>>,
    depth: Vec<usize>,
}

impl SpanningForest {
    /// Iterative depth-first forest over the nodes with `included` set.
    fn depth_first(adjacency: &[Vec<NodeId>], included: &[bool]) -> Self {
        let n = adjacency.len();
        let mut parent = vec![None; n];
        let mut depth = vec![0; n];
        let mut visited = vec![false; n];

        for root in 0..n {
            if !included[root] || visited[root] {
                continue;
            }
            visited[root] = true;
            let mut stack = vec![(root, 0)];
            while let Some((node, cursor)) = stack.last_mut() {
                let node = *node;
                if let Some(&NodeId(child)) = adjacency[node].get(*cursor) {
                    *cursor += 1;
                    if !visited[child] {
                        visited[child] = true;
                        parent[child] = Some(node);
                        depth[child] = depth[node] + 1;
                        stack.push((child, 0));
                    }
                } else {
                    stack.pop();
                }
            }
        }

        Self { parent, depth }
    }

    fn is_tree_edge(&self, a: usize, b: usize) -> bool {
        self.parent[a] == Some(b) || self.parent[b] == Some(a)
    }

    /// The cycle closed by the non-tree edge `a`-`b`: `a` up to the common ancestor,
    /// then down to `b`.
    fn cycle_through(&self, a: usize, b: usize) -> Vec<usize> {
        let (mut x, mut y) = (a, b);
        let mut up = vec![x];
        let mut down = vec![y];
        while self.depth[x] > self.depth[y] {
            x = self.climb(x);
            up.push(x);
        }
        while self.depth[y] > self.depth[x] {
            y = self.climb(y);
            down.push(y);
        }
        while x != y {
            x = self.climb(x);
            y = self.climb(y);
            up.push(x);
            down.push(y);
        }
        // Both paths now end at the common ancestor.
        down.pop();
        up.extend(down.into_iter().rev());
        up
    }

    fn climb(&self, node: usize) -> usize {
        // Endpoints of a non-tree edge share a tree, so a parent exists below the root.
        self.parent[node].unwrap_or(node)
    }
}

fn sorted(cycle: &[usize]) -> Vec<usize> {
    let mut nodes = cycle.to_vec();
    nodes.sort_unstable();
    nodes
}

/// Rotates `cycle` to start at its smallest node, heading toward the smaller neighbor.
fn normalize_rotation(mut cycle: Vec<usize>) -> Vec<usize> {
    let Some(start) = cycle.iter().enumerate().min_by_key(|(_, n)| **n).map(|(i, _)| i) else {
        return cycle;
    };
    cycle.rotate_left(start);
    if cycle.len() > 2 && cycle[cycle.len() - 1] < cycle[1] {
        cycle[1..].reverse();
    }
    cycle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cluster::{Cluster, ClusterId},
        cover::CoverElementId,
        feature_space::{EntityRecord, FeatureSpace},
        graph::MapperGraphBuilder,
    };

    fn annotator() -> TopologyAnnotator {
        TopologyAnnotator {
            dead_zone_min_size: 2,
            min_cycle_length: 3,
            win_threshold: 0.55,
            spirit_threshold: 5.5,
        }
    }

    /// One entity per `(win, spirit)` pair; node `i` is built from `members[i]`.
    fn graph(entities: &[(f64, f64)], members: &[&[usize]]) -> MapperGraph {
        let records = entities
            .iter()
            .enumerate()
            .map(|(i, &(win, spirit))| EntityRecord {
                id: format!("e{i:02}").into(),
                label: None,
                features: vec![0.0],
                win_percentage: win,
                spirit_score: spirit,
            })
            .collect();
        let space = FeatureSpace::new(vec![], records).unwrap();
        let clusters = members
            .iter()
            .enumerate()
            .map(|(i, m)| Cluster {
                id: ClusterId {
                    element: CoverElementId(i),
                    rank: 0,
                },
                members: m.to_vec(),
                threshold: 1.0,
            })
            .collect::<Vec<_>>();
        MapperGraphBuilder::new(&space).build(&clusters)
    }

    const GOOD: (f64, f64) = (0.7, 8.0);
    const BAD: (f64, f64) = (0.4, 3.0);

    fn ids(nodes: &[usize]) -> Vec<NodeId> {
        nodes.iter().copied().map(NodeId).collect()
    }

    #[test]
    fn test_four_cycle_with_isolated_node() {
        // A-B-C-D-A through shared entities, E alone
        let graph = graph(
            &[GOOD, GOOD, GOOD, GOOD, BAD],
            &[&[0, 1], &[1, 2], &[2, 3], &[3, 0], &[4]],
        );
        let annotated = annotator().annotate(graph);

        let manifold = annotated.manifold.as_ref().unwrap();
        assert_eq!(manifold.nodes, ids(&[0, 1, 2, 3]));
        assert!((manifold.mean_win_percentage - 0.7).abs() < 1e-12);
        assert!((manifold.mean_spirit_score - 8.0).abs() < 1e-12);

        assert_eq!(
            annotated.dead_zones,
            [DeadZone {
                nodes: ids(&[4]),
                reason: DeadZoneReason::Isolated
            }]
        );
        assert!(annotated.has_label(NodeId(4), NodeLabel::DeadZone));
        for node in 0..4 {
            assert_eq!(annotated.labels(NodeId(node)), [NodeLabel::ManifoldMember]);
        }
    }

    #[test]
    fn test_forest_has_no_manifold() {
        // path 0-1-2 plus a branch 1-3
        let graph = graph(
            &[GOOD; 5],
            &[&[0, 1], &[1, 2, 4], &[2, 3], &[4]],
        );
        assert_eq!(annotator().winning_manifold(&graph), None);
    }

    #[test]
    fn test_failing_node_breaks_cycle() {
        // entity 2 drags node 2 below the thresholds
        let graph = graph(
            &[GOOD, GOOD, BAD, GOOD],
            &[&[0, 1], &[1, 3], &[2, 3], &[2, 0]],
        );
        assert_eq!(graph.edges().len(), 4);
        assert_eq!(annotator().winning_manifold(&graph), None);
    }

    #[test]
    fn test_thresholds_are_strict() {
        let edge = (0.55, 5.5);
        let graph = graph(&[edge; 3], &[&[0, 1], &[1, 2], &[2, 0]]);
        assert_eq!(annotator().winning_manifold(&graph), None);

        let relaxed = TopologyAnnotator {
            win_threshold: 0.5,
            spirit_threshold: 5.0,
            ..annotator()
        };
        assert_eq!(relaxed.winning_manifold(&graph).unwrap().nodes, ids(&[0, 1, 2]));
    }

    #[test]
    fn test_triangle_is_rejected_by_min_length() {
        let graph = graph(&[GOOD; 3], &[&[0, 1], &[1, 2], &[2, 0]]);
        let annotator = TopologyAnnotator {
            min_cycle_length: 4,
            ..annotator()
        };
        assert_eq!(annotator.winning_manifold(&graph), None);
    }

    #[test]
    fn test_longest_cycle_wins() {
        // Triangle 0-1-2 hangs off node 2; entity 3 ties nodes 2, 3 and 7 together,
        // closing the six-node ring 2-3-4-5-6-7.
        let graph = graph(
            &[GOOD; 9],
            &[
                &[0, 1],
                &[1, 2],
                &[2, 0, 3],
                &[3, 4],
                &[4, 5],
                &[5, 6],
                &[6, 7, 8],
                &[8, 3],
            ],
        );
        let manifold = annotator().winning_manifold(&graph).unwrap();
        assert_eq!(manifold.nodes, ids(&[2, 3, 4, 5, 6, 7]));
    }

    #[test]
    fn test_equal_cycles_prefer_lower_ids() {
        // two disjoint triangles
        let graph = graph(
            &[GOOD; 6],
            &[&[3, 4], &[4, 5], &[5, 3], &[0, 1], &[1, 2], &[2, 0]],
        );
        let manifold = annotator().winning_manifold(&graph).unwrap();
        assert_eq!(manifold.nodes, ids(&[0, 1, 2]));
    }

    #[test]
    fn test_manifold_is_a_cycle_in_graph() {
        let graph = graph(
            &[GOOD; 6],
            &[&[0, 1], &[1, 2], &[2, 3], &[3, 4], &[4, 5], &[5, 0], &[0, 3]],
        );
        let manifold = annotator().winning_manifold(&graph).unwrap();
        let nodes = &manifold.nodes;
        for (i, &node) in nodes.iter().enumerate() {
            let next = nodes[(i + 1) % nodes.len()];
            assert!(graph.edge_between(node, next).is_some(), "{node} -> {next}");
        }
        let mut unique = sorted(&nodes.iter().map(|n| n.0).collect::<Vec<_>>());
        unique.dedup();
        assert_eq!(unique.len(), nodes.len());
    }

    #[test]
    fn test_small_components_are_dead() {
        let graph = graph(
            &[BAD; 7],
            &[&[0, 1], &[1, 2], &[2, 3], &[4, 5], &[5], &[6]],
        );
        let annotator = TopologyAnnotator {
            dead_zone_min_size: 3,
            ..annotator()
        };
        let zones = annotator.dead_zones(&graph);
        assert_eq!(
            zones,
            [
                DeadZone {
                    nodes: ids(&[3, 4]),
                    reason: DeadZoneReason::SmallComponent { size: 2 }
                },
                DeadZone {
                    nodes: ids(&[5]),
                    reason: DeadZoneReason::Isolated
                },
            ]
        );
    }

    #[test]
    fn test_isolated_node_is_dead_with_min_size_one() {
        let graph = graph(&[BAD; 3], &[&[0, 1], &[1], &[2]]);
        let annotator = TopologyAnnotator {
            dead_zone_min_size: 1,
            ..annotator()
        };
        let annotated = annotator.annotate(graph);
        assert!(!annotated.has_label(NodeId(0), NodeLabel::DeadZone));
        assert!(!annotated.has_label(NodeId(1), NodeLabel::DeadZone));
        assert!(annotated.has_label(NodeId(2), NodeLabel::DeadZone));
    }

    #[test]
    fn test_normalize_rotation() {
        assert_eq!(normalize_rotation(vec![5, 2, 9, 3]), [2, 5, 3, 9]);
        assert_eq!(normalize_rotation(vec![4, 1, 2]), [1, 2, 4]);
        assert_eq!(normalize_rotation(vec![]), Vec::<usize>::new());
    }
}
