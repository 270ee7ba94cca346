//! Plain snapshot form of a graph, used for diff inputs and persistence

use crate::error::{FlowError, Result};
use crate::graph::FlowGraph;
use crate::model::{Edge, Node};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// A node-id → node mapping plus the ordered edge list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GraphSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<DateTime<Utc>>,
    pub nodes: BTreeMap<String, Node>,
    pub edges: Vec<Edge>,
}

impl FlowGraph {
    pub fn to_snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            captured_at: None,
            nodes: self.nodes().map(|n| (n.id.clone(), n.clone())).collect(),
            edges: self.edges().to_vec(),
        }
    }

    /// Rebuild a graph. Duplicate edges collapse to the first occurrence.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Result<Self> {
        let mut graph = FlowGraph::new();
        for (key, node) in snapshot.nodes {
            if key != node.id {
                return Err(FlowError::InvalidInput(format!(
                    "node stored under '{}' has id '{}'",
                    key, node.id
                )));
            }
            graph.add_node(node);
        }
        for edge in snapshot.edges {
            graph.add_edge(edge);
        }
        Ok(graph)
    }
}

/// Decode an untyped JSON value into a graph.
///
/// Anything that is not `{ "nodes": {..}, "edges": [..] }` is rejected as
/// invalid input rather than read as an empty graph.
pub fn from_value(value: serde_json::Value) -> Result<FlowGraph> {
    let Some(object) = value.as_object() else {
        return Err(FlowError::InvalidInput(format!(
            "expected a graph object, got {}",
            json_type(&value)
        )));
    };
    match object.get("nodes") {
        Some(serde_json::Value::Object(_)) => {}
        Some(other) => {
            return Err(FlowError::InvalidInput(format!(
                "`nodes` must be an object keyed by id, got {}",
                json_type(other)
            )));
        }
        None => return Err(FlowError::InvalidInput("missing `nodes`".to_string())),
    }
    match object.get("edges") {
        Some(serde_json::Value::Array(_)) => {}
        Some(other) => {
            return Err(FlowError::InvalidInput(format!(
                "`edges` must be an array, got {}",
                json_type(other)
            )));
        }
        None => return Err(FlowError::InvalidInput("missing `edges`".to_string())),
    }

    let snapshot: GraphSnapshot = serde_json::from_value(value)
        .map_err(|e| FlowError::InvalidInput(format!("malformed graph snapshot: {}", e)))?;
    FlowGraph::from_snapshot(snapshot)
}

pub fn from_json_str(json: &str) -> Result<FlowGraph> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    from_value(value)
}

/// Load a graph snapshot from a JSON file.
pub fn load(path: &Path) -> Result<FlowGraph> {
    let json_str = std::fs::read_to_string(path)?;
    let graph = from_json_str(&json_str)?;
    tracing::debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "Snapshot loaded from: {}",
        path.display()
    );
    Ok(graph)
}

/// Write a graph snapshot as pretty JSON, stamped with the capture time.
pub fn save(graph: &FlowGraph, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut snapshot = graph.to_snapshot();
    snapshot.captured_at = Some(Utc::now());

    let json_str = serde_json::to_string_pretty(&snapshot)?;
    std::fs::write(path, json_str)?;

    tracing::debug!("Snapshot saved: {}", path.display());
    Ok(())
}

fn json_type(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
