//! Endpoint subgraph extraction
//!
//! Resolves a request path such as `/api/v1/users/123` to one route node and
//! copies out the connected component around it. Edge direction is ignored
//! while walking and kept on the copied edges.

use crate::graph::FlowGraph;
use crate::model::{Node, NodeKind};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// How the selector was matched to a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// The route's `path` equals the selector.
    Exact,
    /// The route's `path` template (`/users/:id`) matches the selector.
    Pattern,
    /// The route's name contains the selector.
    Name,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedRoute {
    pub node_id: String,
    pub strategy: MatchStrategy,
}

/// Result of an endpoint extraction. `route` is `None` when nothing matched,
/// in which case `graph` is empty.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub graph: FlowGraph,
    pub route: Option<MatchedRoute>,
}

impl Extraction {
    pub fn is_found(&self) -> bool {
        self.route.is_some()
    }
}

/// Extract the component reachable from the route best matching `selector`.
pub fn extract_endpoint(graph: &FlowGraph, selector: &str) -> Extraction {
    let Some((route, strategy)) = find_route(graph, selector) else {
        tracing::debug!("No route matches endpoint {}", selector);
        return Extraction::default();
    };

    let component = connected_component(graph, &route.id);
    tracing::debug!(
        route = %route.id,
        ?strategy,
        nodes = component.node_count(),
        edges = component.edge_count(),
        "Extracted endpoint subgraph"
    );

    Extraction {
        graph: component,
        route: Some(MatchedRoute {
            node_id: route.id.clone(),
            strategy,
        }),
    }
}

/// Find the single best route for `selector`: exact path, then path
/// template, then name substring. Routes are tried in id order.
pub fn find_route<'a>(graph: &'a FlowGraph, selector: &str) -> Option<(&'a Node, MatchStrategy)> {
    if selector.is_empty() {
        return None;
    }
    let routes: Vec<&Node> = graph.nodes_by_type(&NodeKind::Route).collect();

    if let Some(route) = routes.iter().find(|r| r.path() == Some(selector)) {
        return Some((*route, MatchStrategy::Exact));
    }

    let pattern_match = routes.iter().find(|route| {
        let Some(template) = route.path() else {
            return false;
        };
        match route_pattern(template) {
            Ok(pattern) => pattern.is_match(selector),
            Err(e) => {
                tracing::warn!("Skipping route {} with unusable path {:?}: {}", route.id, template, e);
                false
            }
        }
    });
    if let Some(route) = pattern_match {
        return Some((*route, MatchStrategy::Pattern));
    }

    routes
        .iter()
        .find(|r| r.name.contains(selector))
        .map(|r| (*r, MatchStrategy::Name))
}

/// Compile a route template into an anchored regex. `:param` segments match
/// one path segment, `*` matches anything, everything else is literal.
pub fn route_pattern(template: &str) -> Result<Regex, regex::Error> {
    let mut pattern = String::with_capacity(template.len() * 2 + 2);
    pattern.push('^');

    let mut literal_start = 0;
    let mut chars = template.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let placeholder = match c {
            ':' if chars.peek().is_some_and(|&(_, n)| is_word(n)) => "[^/]+",
            // a bare `*` and a named glob like `*path` both match any run of characters
            '*' => ".*",
            _ => continue,
        };
        pattern.push_str(&regex::escape(&template[literal_start..i]));
        pattern.push_str(placeholder);

        let mut end = template.len();
        while let Some(&(j, n)) = chars.peek() {
            if !is_word(n) {
                end = j;
                break;
            }
            chars.next();
        }
        literal_start = end;
    }
    pattern.push_str(&regex::escape(&template[literal_start..]));
    pattern.push('$');

    Regex::new(&pattern)
}

/// Copy the connected component containing `start` into a new graph.
///
/// Every edge touching a visited node is copied, including dangling ones, but
/// only endpoints that exist as nodes are walked into. Returns an empty graph
/// if `start` is not a node.
pub fn connected_component(graph: &FlowGraph, start: &str) -> FlowGraph {
    let mut component = FlowGraph::new();
    if !graph.contains_node(start) {
        return component;
    }

    let edges = graph.edges();
    let mut incident: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, edge) in edges.iter().enumerate() {
        incident.entry(edge.from.as_str()).or_default().push(i);
        if !edge.is_self_loop() {
            incident.entry(edge.to.as_str()).or_default().push(i);
        }
    }

    let mut visited: HashSet<&str> = HashSet::new();
    let mut stack = vec![start];

    while let Some(current) = stack.pop() {
        if !visited.insert(current) {
            continue;
        }
        let Some(node) = graph.find_node(current) else {
            continue;
        };
        component.add_node(node.clone());

        let Some(touching) = incident.get(current) else {
            continue;
        };
        for &i in touching {
            let edge = &edges[i];
            component.add_edge(edge.clone());
            let other = edge.other_end(current);
            if !visited.contains(other) && graph.contains_node(other) {
                stack.push(other);
            }
        }
    }

    component
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
