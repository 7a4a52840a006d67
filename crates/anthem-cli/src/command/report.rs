//! Text report of a generated graph document

use std::path::PathBuf;

use anthem_mapper::{
    annotate::{AnnotatedGraph, DeadZoneReason},
    cover::CoverDiagnostic,
    feature_space::EntityId,
};
use clap::Args;

use crate::util;

const MEMBERS_SHOWN: usize = 4;

#[derive(Debug, Clone, Args)]
pub(crate) struct ReportArg {
    /// Path to the graph JSON file written by `map`
    graph: PathBuf,
}

pub(crate) fn run(arg: &ReportArg) -> anyhow::Result<()> {
    let document = util::read_graph_file(&arg.graph)?;
    let annotated = &document.graph;
    let graph = &annotated.graph;

    println!("Mapper Graph Report");
    println!("===================\n");
    println!("  Generated at: {}", document.generated_at.to_rfc3339());
    println!("  Entities:     {}", document.entity_count);
    println!("  Nodes:        {}", graph.nodes().len());
    println!("  Edges:        {}", graph.edges().len());
    println!(
        "  Cover:        resolution {}, overlap {}, threshold {}",
        document.config.resolution,
        document.config.overlap_fraction,
        document.config.cluster_distance_threshold
    );
    for diagnostic in &document.diagnostics {
        match diagnostic {
            CoverDiagnostic::DegenerateDimension { dimension, value } => println!(
                "  Note:         lens dimension {dimension} is constant ({value}); it was not subdivided"
            ),
        }
    }
    println!();

    print_node_table(annotated);
    println!();
    print_manifold(annotated);
    println!();
    print_dead_zones(annotated);
    Ok(())
}

fn print_node_table(annotated: &AnnotatedGraph) {
    let graph = &annotated.graph;
    println!("Nodes");
    println!(
        "  {:<20} {:>5} {:>7} {:>7} {:>7} {:>7} {:>6}  {:<28} {}",
        "Node", "Size", "MinWin", "Win", "MaxWin", "Spirit", "Degree", "Labels", "Members"
    );
    println!("  {}", "-".repeat(110));
    for node in graph.nodes() {
        let stats = &node.stats;
        let labels = annotated
            .labels(node.id)
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let mut members = node
            .members
            .iter()
            .take(MEMBERS_SHOWN)
            .map(EntityId::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        if node.members.len() > MEMBERS_SHOWN {
            members.push_str(&format!(", +{}", node.members.len() - MEMBERS_SHOWN));
        }
        println!(
            "  {:<20} {:>5} {:>7.3} {:>7.3} {:>7.3} {:>7.2} {:>6}  {:<28} {}",
            node.name(),
            stats.size,
            stats.min_win_percentage,
            stats.mean_win_percentage,
            stats.max_win_percentage,
            stats.mean_spirit_score,
            graph.degree(node.id),
            labels,
            members,
        );
    }
}

fn print_manifold(annotated: &AnnotatedGraph) {
    let Some(manifold) = &annotated.manifold else {
        println!("Winning manifold: none");
        return;
    };
    let cycle = manifold
        .nodes
        .iter()
        .map(|&n| annotated.graph.node(n).name())
        .collect::<Vec<_>>();
    println!(
        "Winning manifold: {} nodes, mean win {:.3}, mean spirit {:.2}",
        cycle.len(),
        manifold.mean_win_percentage,
        manifold.mean_spirit_score
    );
    println!("  {} -> {}", cycle.join(" -> "), cycle[0]);
}

fn print_dead_zones(annotated: &AnnotatedGraph) {
    println!("Dead zones: {}", annotated.dead_zones.len());
    for zone in &annotated.dead_zones {
        let reason = match zone.reason {
            DeadZoneReason::Isolated => "isolated".to_string(),
            DeadZoneReason::SmallComponent { size } => format!("component of {size}"),
        };
        let nodes = zone
            .nodes
            .iter()
            .map(|&n| annotated.graph.node(n).name())
            .collect::<Vec<_>>()
            .join(", ");
        println!("  {reason:<16} {nodes}");
    }
}
