//! CLI command implementations

use anyhow::Context;
use flowmap_core::{ComplexityAnalyzer, DiffEngine, FlowConfig, FlowGraph, GraphSnapshot, MatchedRoute};
use serde::Serialize;
use std::path::Path;

/// Output of `flowmap extract`.
#[derive(Serialize)]
struct ExtractOutput {
    route: MatchedRoute,
    graph: GraphSnapshot,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<FlowConfig> {
    match path {
        Some(path) => FlowConfig::load(path)
            .with_context(|| format!("Cannot read configuration {}", path.display())),
        None => Ok(FlowConfig::default()),
    }
}

pub fn diff(
    config: &FlowConfig,
    before: Option<&Path>,
    after: Option<&Path>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let before = before.map(load_graph).transpose()?;
    let after = after.map(load_graph).transpose()?;

    let engine = DiffEngine::new(config.diff.clone());
    let diff = engine.compute_optional(before.as_ref(), after.as_ref());

    tracing::info!(
        "{} changes, {} breaking",
        diff.summary.total_changes,
        diff.summary.breaking_changes.len()
    );
    for breaking in &diff.summary.breaking_changes {
        tracing::warn!("Breaking: {}", breaking);
    }

    write_json(&diff, output)
}

pub fn extract(graph_path: &Path, endpoint: &str, output: Option<&Path>) -> anyhow::Result<()> {
    let graph = load_graph(graph_path)?;
    let extraction = flowmap_core::extract_endpoint(&graph, endpoint);

    let Some(route) = extraction.route else {
        anyhow::bail!("No route matches endpoint {}", endpoint);
    };
    tracing::info!(
        "Matched {} ({:?}): {} nodes, {} edges",
        route.node_id,
        route.strategy,
        extraction.graph.node_count(),
        extraction.graph.edge_count()
    );

    write_json(
        &ExtractOutput {
            route,
            graph: extraction.graph.to_snapshot(),
        },
        output,
    )
}

pub fn analyze(config: &FlowConfig, graph_path: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let graph = load_graph(graph_path)?;
    let report = ComplexityAnalyzer::new(config.analysis.clone()).report(&graph);

    for cycle in &report.circular_dependencies {
        tracing::warn!("Circular dependency: {}", cycle.join(" → "));
    }
    for god in &report.god_objects {
        tracing::warn!("{} has {} connections", god.name, god.score);
    }

    write_json(&report, output)
}

fn load_graph(path: &Path) -> anyhow::Result<FlowGraph> {
    let graph = flowmap_core::snapshot::load(path)
        .with_context(|| format!("Cannot load graph snapshot {}", path.display()))?;
    tracing::info!(
        "Loaded {}: {} nodes, {} edges",
        path.display(),
        graph.node_count(),
        graph.edge_count()
    );
    Ok(graph)
}

fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Cannot write {}", path.display()))?;
            tracing::info!("Wrote {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
