//! Structural diff between two graph snapshots

use crate::config::DiffConfig;
use crate::graph::FlowGraph;
use crate::model::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Everything that changed between a `before` and an `after` snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphDiff {
    /// Nodes whose id only exists in `after`.
    pub added_nodes: Vec<Node>,
    /// Nodes whose id only exists in `before`.
    pub removed_nodes: Vec<Node>,
    /// Nodes present on both sides whose name, type or attributes differ.
    pub modified_nodes: Vec<NodeModification>,
    /// Edges in `after` with no `(from, to, type)` match in `before`.
    pub added_edges: Vec<Edge>,
    /// Edges in `before` with no `(from, to, type)` match in `after`.
    pub removed_edges: Vec<Edge>,
    pub metrics_change: MetricsChange,
    pub summary: DiffSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeModification {
    pub before: Node,
    pub after: Node,
    pub changes: Vec<NodeChange>,
}

/// One itemised difference inside a modified node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeChange {
    Name { before: String, after: String },
    Kind { before: NodeKind, after: NodeKind },
    AssociationsAdded { items: Vec<String> },
    AssociationsRemoved { items: Vec<String> },
    /// Attribute keys whose values differ, were added or were dropped.
    Attributes { keys: Vec<String> },
}

/// Before/after count with the signed difference.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CountChange {
    pub before: usize,
    pub after: usize,
    pub change: i64,
}

impl CountChange {
    fn new(before: usize, after: usize) -> Self {
        CountChange {
            before,
            after,
            change: after as i64 - before as i64,
        }
    }
}

/// Graph complexity (`nodes + 2 × edges`) on both sides.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ComplexityChange {
    pub before: usize,
    pub after: usize,
    pub change: i64,
    /// Change relative to `before`, rounded to two decimals. Zero when
    /// `before` is zero.
    pub percentage: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MetricsChange {
    pub nodes: CountChange,
    pub edges: CountChange,
    pub complexity: ComplexityChange,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DiffSummary {
    pub total_changes: usize,
    pub breaking_changes: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Change state of a single node id, for renderers that colour by status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeStatus {
    Added,
    Removed,
    Modified,
    Unchanged,
}

impl GraphDiff {
    /// Check if this diff is empty (no changes).
    pub fn is_empty(&self) -> bool {
        self.added_nodes.is_empty()
            && self.removed_nodes.is_empty()
            && self.added_edges.is_empty()
            && self.removed_edges.is_empty()
            && self.modified_nodes.is_empty()
    }

    pub fn status_of(&self, id: &str) -> ChangeStatus {
        if self.added_nodes.iter().any(|n| n.id == id) {
            ChangeStatus::Added
        } else if self.removed_nodes.iter().any(|n| n.id == id) {
            ChangeStatus::Removed
        } else if self.modified_nodes.iter().any(|m| m.after.id == id) {
            ChangeStatus::Modified
        } else {
            ChangeStatus::Unchanged
        }
    }
}

/// `nodes + 2 × edges`.
pub fn graph_complexity(graph: &FlowGraph) -> usize {
    graph.node_count() + graph.edge_count() * 2
}

/// Computes `GraphDiff`s under a fixed set of recommendation thresholds.
#[derive(Debug, Clone, Default)]
pub struct DiffEngine {
    config: DiffConfig,
}

impl DiffEngine {
    pub fn new(config: DiffConfig) -> Self {
        DiffEngine { config }
    }

    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// Compute the difference between two graph states.
    ///
    /// Lists follow node-id order and edge insertion order, so the same two
    /// inputs always give the same result.
    pub fn compute(&self, before: &FlowGraph, after: &FlowGraph) -> GraphDiff {
        let mut added_nodes = Vec::new();
        let mut removed_nodes = Vec::new();
        let mut modified_nodes = Vec::new();

        // Find added nodes
        for node in after.nodes() {
            if !before.contains_node(&node.id) {
                added_nodes.push(node.clone());
            }
        }

        // Find removed and modified nodes
        for old in before.nodes() {
            match after.find_node(&old.id) {
                None => removed_nodes.push(old.clone()),
                Some(new) if node_changed(old, new) => modified_nodes.push(NodeModification {
                    before: old.clone(),
                    after: new.clone(),
                    changes: node_changes(old, new),
                }),
                Some(_) => {}
            }
        }

        // Find added and removed edges by (from, to, type)
        let added_edges: Vec<Edge> = after
            .edges()
            .iter()
            .filter(|e| !before.contains_edge(&e.key()))
            .cloned()
            .collect();
        let removed_edges: Vec<Edge> = before
            .edges()
            .iter()
            .filter(|e| !after.contains_edge(&e.key()))
            .cloned()
            .collect();

        let metrics_change = metrics_change(before, after);

        let mut diff = GraphDiff {
            added_nodes,
            removed_nodes,
            modified_nodes,
            added_edges,
            removed_edges,
            metrics_change,
            summary: DiffSummary::default(),
        };
        diff.summary = DiffSummary {
            total_changes: diff.added_nodes.len()
                + diff.removed_nodes.len()
                + diff.modified_nodes.len()
                + diff.added_edges.len()
                + diff.removed_edges.len(),
            breaking_changes: breaking_changes(&diff),
            recommendations: self.recommendations(&diff),
        };

        tracing::debug!(
            added_nodes = diff.added_nodes.len(),
            removed_nodes = diff.removed_nodes.len(),
            modified_nodes = diff.modified_nodes.len(),
            added_edges = diff.added_edges.len(),
            removed_edges = diff.removed_edges.len(),
            "Computed graph diff"
        );

        diff
    }

    /// Like `compute`, with a missing side read as an empty graph.
    pub fn compute_optional(&self, before: Option<&FlowGraph>, after: Option<&FlowGraph>) -> GraphDiff {
        let empty = FlowGraph::new();
        self.compute(before.unwrap_or(&empty), after.unwrap_or(&empty))
    }

    fn recommendations(&self, diff: &GraphDiff) -> Vec<String> {
        let mut recommendations = Vec::new();

        if diff.added_nodes.len() > self.config.large_change_nodes {
            recommendations
                .push("Consider breaking down the changes into smaller changesets".to_string());
        }

        let percentage = diff.metrics_change.complexity.percentage;
        if percentage > self.config.complexity_increase_percent {
            recommendations.push(format!(
                "Complexity increased by {:?}%. Consider refactoring",
                percentage
            ));
        }

        let edge_budget = diff.added_nodes.len().saturating_mul(self.config.edge_to_node_ratio);
        if diff.added_edges.len() > edge_budget {
            recommendations
                .push("Many new dependencies added. Check for circular dependencies".to_string());
        }

        recommendations
    }
}

fn node_changed(before: &Node, after: &Node) -> bool {
    before.name != after.name || before.kind != after.kind || before.attributes != after.attributes
}

fn node_changes(before: &Node, after: &Node) -> Vec<NodeChange> {
    let mut changes = Vec::new();

    if before.name != after.name {
        changes.push(NodeChange::Name {
            before: before.name.clone(),
            after: after.name.clone(),
        });
    }

    if before.kind != after.kind {
        changes.push(NodeChange::Kind {
            before: before.kind.clone(),
            after: after.kind.clone(),
        });
    }

    if before.attributes != after.attributes {
        let old_assoc = associations(before);
        let new_assoc = associations(after);

        let added = set_difference(&new_assoc, &old_assoc);
        if !added.is_empty() {
            changes.push(NodeChange::AssociationsAdded { items: added });
        }
        let removed = set_difference(&old_assoc, &new_assoc);
        if !removed.is_empty() {
            changes.push(NodeChange::AssociationsRemoved { items: removed });
        }

        let keys: BTreeSet<&String> = before.attributes.keys().chain(after.attributes.keys()).collect();
        let changed: Vec<String> = keys
            .into_iter()
            .filter(|k| before.attributes.get(*k) != after.attributes.get(*k))
            .cloned()
            .collect();
        changes.push(NodeChange::Attributes { keys: changed });
    }

    changes
}

/// The string items of a node's `associations` attribute, if it is a list.
fn associations(node: &Node) -> Vec<&str> {
    node.attributes
        .get(ASSOCIATIONS_ATTRIBUTE)
        .and_then(|v| v.as_array())
        .map(|items| items.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default()
}

/// Items of `left` not in `right`, deduplicated, in `left` order.
fn set_difference(left: &[&str], right: &[&str]) -> Vec<String> {
    let exclude: HashSet<&str> = right.iter().copied().collect();
    let mut seen: HashSet<&str> = HashSet::new();
    left.iter()
        .copied()
        .filter(|item| !exclude.contains(item) && seen.insert(*item))
        .map(str::to_string)
        .collect()
}

fn metrics_change(before: &FlowGraph, after: &FlowGraph) -> MetricsChange {
    let before_complexity = graph_complexity(before);
    let after_complexity = graph_complexity(after);
    let change = after_complexity as i64 - before_complexity as i64;
    let percentage = if before_complexity > 0 {
        (change as f64 * 100.0 / before_complexity as f64 * 100.0).round() / 100.0
    } else {
        0.0
    };

    MetricsChange {
        nodes: CountChange::new(before.node_count(), after.node_count()),
        edges: CountChange::new(before.edge_count(), after.edge_count()),
        complexity: ComplexityChange {
            before: before_complexity,
            after: after_complexity,
            change,
            percentage,
        },
    }
}

fn breaking_changes(diff: &GraphDiff) -> Vec<String> {
    let mut breaking = Vec::new();

    for node in &diff.removed_nodes {
        if matches!(node.kind, NodeKind::Controller | NodeKind::Action | NodeKind::Route) {
            breaking.push(format!("{} '{}' was removed", capitalize(node.kind.as_str()), node.name));
        }
    }

    for edge in &diff.removed_edges {
        if edge.kind == EdgeKind::BelongsTo {
            breaking.push(format!("Association removed: {} belongs_to {}", edge.from, edge.to));
        }
    }

    breaking
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_difference_dedups_in_order() {
        assert_eq!(set_difference(&["c", "a", "c", "b"], &["b"]), vec!["c", "a"]);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("controller"), "Controller");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_association_changes() {
        let before = Node::new("model_post", "Post", NodeKind::Model)
            .with_attribute(ASSOCIATIONS_ATTRIBUTE, json!(["user", "comments"]));
        let after = Node::new("model_post", "Post", NodeKind::Model)
            .with_attribute(ASSOCIATIONS_ATTRIBUTE, json!(["user", "tags", "likes"]));

        let changes = node_changes(&before, &after);
        assert_eq!(
            changes,
            vec![
                NodeChange::AssociationsAdded {
                    items: vec!["tags".to_string(), "likes".to_string()]
                },
                NodeChange::AssociationsRemoved {
                    items: vec!["comments".to_string()]
                },
                NodeChange::Attributes {
                    keys: vec![ASSOCIATIONS_ATTRIBUTE.to_string()]
                },
            ]
        );
    }

    #[test]
    fn test_percentage_rounding() {
        let mut before = FlowGraph::new();
        for id in ["a", "b", "c"] {
            before.add_node(Node::new(id, id, NodeKind::Service));
        }
        let mut after = before.clone();
        after.add_node(Node::new("d", "d", NodeKind::Service));

        let metrics = metrics_change(&before, &after);
        assert_eq!(metrics.complexity.change, 1);
        assert_eq!(metrics.complexity.percentage, 33.33);
    }
}
