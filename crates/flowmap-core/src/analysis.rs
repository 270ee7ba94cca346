//! Connectivity scoring and circular dependency detection
//!
//! A node's complexity score is its in-degree plus its out-degree. Scores,
//! dependency breakdowns and cycles feed the `MetricsReport`, which also
//! carries the heuristic warnings (god objects, fat controllers, missing
//! service layer).

use crate::config::AnalysisConfig;
use crate::graph::FlowGraph;
use crate::model::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Instant;

/// A node paired with a count (connections, actions, callers).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeScore {
    pub node_id: String,
    pub name: String,
    pub score: usize,
}

/// Incoming/outgoing edge counts of one node, with the distinct edge types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DependencyBreakdown {
    pub node_id: String,
    pub name: String,
    pub outgoing: usize,
    pub outgoing_types: Vec<EdgeKind>,
    pub incoming: usize,
    pub incoming_types: Vec<EdgeKind>,
}

impl DependencyBreakdown {
    pub fn total(&self) -> usize {
        self.outgoing + self.incoming
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Overview {
    pub total_nodes: usize,
    pub total_edges: usize,
    /// Node count per type tag. Well-known types are always present.
    pub nodes_by_type: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceLayer {
    pub total_services: usize,
    /// `None` when there are no controllers to divide by.
    pub services_per_controller: Option<f64>,
    /// Services ranked by incoming `calls_service` edges.
    pub most_used: Vec<NodeScore>,
}

/// Structured metrics for one graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricsReport {
    pub overview: Overview,
    pub most_connected_models: Vec<NodeScore>,
    /// Controllers ranked by `has_action` edges.
    pub most_complex_controllers: Vec<NodeScore>,
    pub model_dependencies: Vec<DependencyBreakdown>,
    pub service_layer: ServiceLayer,
    /// First cycle found from each DFS root, as node names.
    pub circular_dependencies: Vec<Vec<String>>,
    /// Every group of nodes that is mutually reachable.
    pub cycle_groups: Vec<Vec<String>>,
    pub god_objects: Vec<NodeScore>,
    pub recommendations: Vec<String>,
}

/// Runs the per-graph analyses under a fixed set of thresholds.
#[derive(Debug, Clone, Default)]
pub struct ComplexityAnalyzer {
    config: AnalysisConfig,
}

impl ComplexityAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        ComplexityAnalyzer { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Models whose complexity score exceeds the god-object threshold.
    pub fn god_objects(&self, graph: &FlowGraph) -> Vec<NodeScore> {
        node_complexity(graph, &NodeKind::Model)
            .into_iter()
            .filter(|s| s.score > self.config.god_object_threshold)
            .collect()
    }

    pub fn report(&self, graph: &FlowGraph) -> MetricsReport {
        let started = Instant::now();
        let top_n = self.config.top_n;

        let mut nodes_by_type: BTreeMap<String, usize> = NodeKind::known()
            .iter()
            .map(|k| (k.as_str().to_string(), 0))
            .collect();
        for node in graph.nodes() {
            *nodes_by_type.entry(node.kind.as_str().to_string()).or_insert(0) += 1;
        }
        let controller_count = nodes_by_type.get(NodeKind::Controller.as_str()).copied().unwrap_or(0);
        let service_count = nodes_by_type.get(NodeKind::Service.as_str()).copied().unwrap_or(0);

        let model_scores = node_complexity(graph, &NodeKind::Model);
        let controller_actions = controller_actions(graph);
        let god_objects: Vec<NodeScore> = model_scores
            .iter()
            .filter(|s| s.score > self.config.god_object_threshold)
            .cloned()
            .collect();
        let circular_dependencies = detect_cycles(graph);

        let mut recommendations = Vec::new();
        if let Some(top) = model_scores.first() {
            if top.score > self.config.overloaded_model_threshold {
                recommendations.push(format!(
                    "Consider breaking down {} - it has too many relationships",
                    top.name
                ));
            }
        }
        if service_count == 0 && controller_count > self.config.service_layer_controllers {
            recommendations
                .push("Consider implementing a service layer to separate business logic".to_string());
        }
        let fat_controllers: Vec<&str> = controller_actions
            .iter()
            .filter(|s| s.score > self.config.fat_controller_actions)
            .map(|s| s.name.as_str())
            .collect();
        if !fat_controllers.is_empty() {
            recommendations.push(format!(
                "These controllers have too many actions: {}. Consider splitting into multiple controllers or using namespaces",
                fat_controllers.join(", ")
            ));
        }
        if !circular_dependencies.is_empty() {
            recommendations.push(format!(
                "Break up {} circular dependency chain(s)",
                circular_dependencies.len()
            ));
        }

        let services_per_controller = (controller_count > 0)
            .then(|| (service_count as f64 / controller_count as f64 * 100.0).round() / 100.0);

        let report = MetricsReport {
            overview: Overview {
                total_nodes: graph.node_count(),
                total_edges: graph.edge_count(),
                nodes_by_type,
            },
            most_connected_models: model_scores.into_iter().take(top_n).collect(),
            most_complex_controllers: controller_actions.into_iter().take(top_n).collect(),
            model_dependencies: dependency_breakdown(graph, &NodeKind::Model)
                .into_iter()
                .take(top_n)
                .collect(),
            service_layer: ServiceLayer {
                total_services: service_count,
                services_per_controller,
                most_used: service_usage(graph).into_iter().take(top_n).collect(),
            },
            circular_dependencies,
            cycle_groups: strongly_connected_components(graph),
            god_objects,
            recommendations,
        };

        tracing::debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            cycles = report.circular_dependencies.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Built metrics report"
        );

        report
    }
}

/// In-degree plus out-degree. A self-loop counts on both sides.
pub fn complexity_score(graph: &FlowGraph, id: &str) -> usize {
    graph
        .edges()
        .iter()
        .map(|e| usize::from(e.from == id) + usize::from(e.to == id))
        .sum()
}

/// Nodes of `kind` ranked by complexity score, highest first. Ties keep
/// node-id order.
pub fn node_complexity(graph: &FlowGraph, kind: &NodeKind) -> Vec<NodeScore> {
    let degrees = degrees(graph);
    let mut scores: Vec<NodeScore> = graph
        .nodes_by_type(kind)
        .map(|node| {
            let (outgoing, incoming) = degrees.get(node.id.as_str()).copied().unwrap_or_default();
            NodeScore {
                node_id: node.id.clone(),
                name: node.name.clone(),
                score: outgoing + incoming,
            }
        })
        .collect();
    scores.sort_by(|a, b| b.score.cmp(&a.score));
    scores
}

/// Per-node dependency breakdown for nodes of `kind`, ranked by total edges.
pub fn dependency_breakdown(graph: &FlowGraph, kind: &NodeKind) -> Vec<DependencyBreakdown> {
    // (outgoing, outgoing kinds, incoming, incoming kinds) per endpoint id
    let mut index: HashMap<&str, (usize, Vec<&EdgeKind>, usize, Vec<&EdgeKind>)> = HashMap::new();
    for edge in graph.edges() {
        let out = index.entry(edge.from.as_str()).or_default();
        out.0 += 1;
        push_distinct(&mut out.1, &edge.kind);
        let inc = index.entry(edge.to.as_str()).or_default();
        inc.2 += 1;
        push_distinct(&mut inc.3, &edge.kind);
    }

    let mut breakdowns: Vec<DependencyBreakdown> = graph
        .nodes_by_type(kind)
        .map(|node| {
            let (outgoing, outgoing_types, incoming, incoming_types) =
                index.get(node.id.as_str()).cloned().unwrap_or_default();
            DependencyBreakdown {
                node_id: node.id.clone(),
                name: node.name.clone(),
                outgoing,
                outgoing_types: outgoing_types.into_iter().cloned().collect(),
                incoming,
                incoming_types: incoming_types.into_iter().cloned().collect(),
            }
        })
        .collect();
    breakdowns.sort_by(|a, b| b.total().cmp(&a.total()));
    breakdowns
}

/// Controllers ranked by their number of `has_action` edges.
pub fn controller_actions(graph: &FlowGraph) -> Vec<NodeScore> {
    let mut actions: HashMap<&str, usize> = HashMap::new();
    for edge in graph.edges_by_type(&EdgeKind::HasAction) {
        *actions.entry(edge.from.as_str()).or_default() += 1;
    }
    ranked(graph, &NodeKind::Controller, &actions)
}

/// Services ranked by their number of incoming `calls_service` edges.
pub fn service_usage(graph: &FlowGraph) -> Vec<NodeScore> {
    let mut callers: HashMap<&str, usize> = HashMap::new();
    for edge in graph.edges_by_type(&EdgeKind::CallsService) {
        *callers.entry(edge.to.as_str()).or_default() += 1;
    }
    ranked(graph, &NodeKind::Service, &callers)
}

/// Nodes of `kind` scored from `counts`, highest first, ties in id order.
fn ranked(graph: &FlowGraph, kind: &NodeKind, counts: &HashMap<&str, usize>) -> Vec<NodeScore> {
    let mut scores: Vec<NodeScore> = graph
        .nodes_by_type(kind)
        .map(|node| NodeScore {
            node_id: node.id.clone(),
            name: node.name.clone(),
            score: counts.get(node.id.as_str()).copied().unwrap_or(0),
        })
        .collect();
    scores.sort_by(|a, b| b.score.cmp(&a.score));
    scores
}

/// Depth-first cycle search over directed edges.
///
/// Roots are tried in node-id order. The walk from a root stops at the first
/// edge that closes a cycle; that cycle is reported as the names along the
/// current path from the repeated node onwards. Nodes already visited from an
/// earlier root are not walked again, so this finds at least one cycle when
/// any exists but does not list every cycle.
pub fn detect_cycles(graph: &FlowGraph) -> Vec<Vec<String>> {
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in graph.edges() {
        adjacency.entry(edge.from.as_str()).or_default().push(edge.to.as_str());
    }

    let mut visited: HashSet<&str> = HashSet::new();
    let mut cycles = Vec::new();

    for root in graph.nodes() {
        let root = root.id.as_str();
        if !visited.insert(root) {
            continue;
        }

        // (node, index of the next outgoing target to try)
        let mut stack: Vec<(&str, usize)> = vec![(root, 0)];
        let mut on_stack: HashSet<&str> = HashSet::from([root]);

        while let Some(&(node, next)) = stack.last() {
            let Some(target) = adjacency.get(node).and_then(|targets| targets.get(next)).copied() else {
                stack.pop();
                on_stack.remove(node);
                continue;
            };
            if let Some(top) = stack.last_mut() {
                top.1 += 1;
            }

            if visited.insert(target) {
                on_stack.insert(target);
                stack.push((target, 0));
            } else if on_stack.contains(target) {
                if let Some(start) = stack.iter().position(|(n, _)| *n == target) {
                    cycles.push(
                        stack[start..]
                            .iter()
                            .map(|(id, _)| display_name(graph, id))
                            .collect(),
                    );
                }
                break;
            }
        }
    }

    tracing::debug!(cycles = cycles.len(), "Cycle detection finished");
    cycles
}

/// Groups of mutually reachable nodes (size > 1, or a node with a self-loop),
/// as sorted name lists. Dangling edges are ignored.
pub fn strongly_connected_components(graph: &FlowGraph) -> Vec<Vec<String>> {
    let projected = graph.to_petgraph();
    let mut groups: Vec<Vec<String>> = petgraph::algo::tarjan_scc(&projected)
        .into_iter()
        .filter(|component| {
            component.len() > 1
                || component.first().is_some_and(|&ix| projected.contains_edge(ix, ix))
        })
        .map(|component| {
            let mut names: Vec<String> = component.iter().map(|&ix| projected[ix].name.clone()).collect();
            names.sort();
            names
        })
        .collect();
    groups.sort();
    groups
}

/// (outgoing, incoming) edge counts per endpoint id.
fn degrees(graph: &FlowGraph) -> HashMap<&str, (usize, usize)> {
    let mut degrees: HashMap<&str, (usize, usize)> = HashMap::new();
    for edge in graph.edges() {
        degrees.entry(edge.from.as_str()).or_default().0 += 1;
        degrees.entry(edge.to.as_str()).or_default().1 += 1;
    }
    degrees
}

fn push_distinct<'a>(kinds: &mut Vec<&'a EdgeKind>, kind: &'a EdgeKind) {
    if !kinds.contains(&kind) {
        kinds.push(kind);
    }
}

fn display_name(graph: &FlowGraph, id: &str) -> String {
    graph
        .find_node(id)
        .map(|n| n.name.clone())
        .unwrap_or_else(|| id.to_string())
}
