//! Graph store: an id-keyed node map plus an ordered, deduplicated edge list

use crate::model::*;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Which incident edges `connected_nodes` follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeDirection {
    Outgoing,
    Incoming,
    Both,
}

/// The architecture graph, a directed multigraph keyed by string node ids.
///
/// Nodes are kept in id order so that every scan over them is deterministic.
/// Edges keep insertion order; at most one edge exists per `(from, to, type)`.
/// Edges may point at ids that have no node.
#[derive(Clone, Default, PartialEq)]
pub struct FlowGraph {
    nodes: BTreeMap<String, Node>,
    edges: Vec<Edge>,
    edge_keys: HashSet<EdgeKey>,
}

impl std::fmt::Debug for FlowGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowGraph")
            .field("node_count", &self.nodes.len())
            .field("edge_count", &self.edges.len())
            .finish()
    }
}

impl FlowGraph {
    pub fn new() -> Self {
        FlowGraph::default()
    }

    /// Insert or overwrite a node by id. Returns true if the id was new.
    pub fn add_node(&mut self, node: Node) -> bool {
        self.nodes.insert(node.id.clone(), node).is_none()
    }

    /// Append an edge unless one with the same `(from, to, type)` exists.
    /// Returns true if the edge was added.
    pub fn add_edge(&mut self, edge: Edge) -> bool {
        if !self.edge_keys.insert(edge.key()) {
            return false;
        }
        self.edges.push(edge);
        true
    }

    /// Get a node by id.
    pub fn find_node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn contains_edge(&self, key: &EdgeKey) -> bool {
        self.edge_keys.contains(key)
    }

    /// Total number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Total number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Iterate over all nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Get all nodes of a specific kind.
    pub fn nodes_by_type<'a>(&'a self, kind: &'a NodeKind) -> impl Iterator<Item = &'a Node> + 'a {
        self.nodes.values().filter(move |n| &n.kind == kind)
    }

    /// Get all edges of a specific kind.
    pub fn edges_by_type<'a>(&'a self, kind: &'a EdgeKind) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| &e.kind == kind)
    }

    /// Get all outgoing edges from a node.
    pub fn edges_from<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.from == id)
    }

    /// Get all incoming edges to a node.
    pub fn edges_to<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.to == id)
    }

    /// Edges with `id` at either end, each listed once.
    pub fn edges_touching<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.touches(id))
    }

    /// Edges whose `from` or `to` has no node in this graph.
    pub fn dangling_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges
            .iter()
            .filter(|e| !self.nodes.contains_key(&e.from) || !self.nodes.contains_key(&e.to))
    }

    /// Neighbouring nodes reached over edges in `direction`.
    ///
    /// Each neighbour appears once, in order of the first edge that reaches
    /// it. Endpoints without a node are skipped.
    pub fn connected_nodes(&self, id: &str, direction: EdgeDirection) -> Vec<&Node> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut found = Vec::new();

        for edge in &self.edges {
            let neighbour = match direction {
                EdgeDirection::Outgoing if edge.from == id => edge.to.as_str(),
                EdgeDirection::Incoming if edge.to == id => edge.from.as_str(),
                EdgeDirection::Both if edge.touches(id) => edge.other_end(id),
                _ => continue,
            };
            if !seen.insert(neighbour) {
                continue;
            }
            if let Some(node) = self.nodes.get(neighbour) {
                found.push(node);
            }
        }

        found
    }

    /// Union `other` into this graph. On an id collision `other`'s node wins;
    /// edges already present by identity are kept as they are.
    pub fn merge(&mut self, other: &FlowGraph) {
        let mut new_nodes = 0;
        let mut new_edges = 0;
        for node in other.nodes() {
            if self.add_node(node.clone()) {
                new_nodes += 1;
            }
        }
        for edge in other.edges() {
            if self.add_edge(edge.clone()) {
                new_edges += 1;
            }
        }
        tracing::debug!(new_nodes, new_edges, "merged graph");
    }

    /// Project into a petgraph `DiGraph`, dropping dangling edges.
    ///
    /// Node indices follow id order.
    pub fn to_petgraph(&self) -> DiGraph<&Node, &Edge> {
        let mut projected = DiGraph::with_capacity(self.nodes.len(), self.edges.len());
        let mut index: HashMap<&str, NodeIndex> = HashMap::with_capacity(self.nodes.len());

        for node in self.nodes.values() {
            index.insert(node.id.as_str(), projected.add_node(node));
        }
        for edge in &self.edges {
            if let (Some(&from), Some(&to)) = (index.get(edge.from.as_str()), index.get(edge.to.as_str())) {
                projected.add_edge(from, to, edge);
            }
        }

        projected
    }
}
