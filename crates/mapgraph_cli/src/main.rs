//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `mapgraph_core` linkage from a standalone binary.
//! - Run one short cascade scenario and report the integrity audit.

use mapgraph_core::{core_version, Graph};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("mapgraph_core version={}", core_version());

    let mut graph = Graph::new();
    let registry = graph.create_registry();
    let way = graph.create_way();
    let nodes: Vec<_> = (0..5)
        .map(|step| graph.create_node(f64::from(step), f64::from(step)))
        .collect();
    for node in &nodes {
        graph.push_node(way, *node);
    }
    graph.register(registry, way);

    for node in nodes.iter().rev().take(4) {
        graph.destroy(*node);
    }
    let held = graph.registry(registry).map_or(0, |current| current.len());
    println!(
        "mapgraph_core scenario=short_way_cleanup way_alive={} registry_len={held}",
        graph.is_alive(way)
    );

    match graph.verify_integrity() {
        Ok(()) => {
            println!("mapgraph_core integrity=ok");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("mapgraph_core integrity=error detail={err}");
            ExitCode::FAILURE
        }
    }
}
