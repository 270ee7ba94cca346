//! Core data structures for the architecture graph

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Opaque producer-owned key/value data attached to nodes and edges.
///
/// The engine only compares attribute maps for equality. The one exception is
/// the conventional `associations` list, which the diff engine unpacks.
pub type Attributes = BTreeMap<String, serde_json::Value>;

/// Attribute holding a route node's path template (`/users/:id`).
pub const PATH_ATTRIBUTE: &str = "path";

/// Attribute holding a model's association names.
pub const ASSOCIATIONS_ATTRIBUTE: &str = "associations";

/// Discriminates what kind of architectural entity a node represents.
///
/// Producers may introduce tags the engine does not know about; those land in
/// `Other` and round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    Model,
    Controller,
    Action,
    Route,
    Service,
    Response,
    Other(String),
}

impl NodeKind {
    pub fn as_str(&self) -> &str {
        match self {
            NodeKind::Model => "model",
            NodeKind::Controller => "controller",
            NodeKind::Action => "action",
            NodeKind::Route => "route",
            NodeKind::Service => "service",
            NodeKind::Response => "response",
            NodeKind::Other(tag) => tag,
        }
    }

    /// Build a run-independent node id of the form `<type>_<snake_name>`.
    ///
    /// Meant for constant-style names: `Api::V1::UsersController` becomes
    /// `controller_api/v1/users_controller`. Routes use [`route_id`].
    pub fn stable_id(&self, canonical_name: &str) -> String {
        format!("{}_{}", self.as_str(), underscore(canonical_name))
    }

    /// The well-known kinds, in reporting order.
    pub fn known() -> [NodeKind; 6] {
        [
            NodeKind::Model,
            NodeKind::Controller,
            NodeKind::Action,
            NodeKind::Route,
            NodeKind::Service,
            NodeKind::Response,
        ]
    }
}

impl From<&str> for NodeKind {
    fn from(tag: &str) -> Self {
        match tag {
            "model" => NodeKind::Model,
            "controller" => NodeKind::Controller,
            "action" => NodeKind::Action,
            "route" => NodeKind::Route,
            "service" => NodeKind::Service,
            "response" => NodeKind::Response,
            other => NodeKind::Other(other.to_string()),
        }
    }
}

impl From<String> for NodeKind {
    fn from(tag: String) -> Self {
        NodeKind::from(tag.as_str())
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of relationship an edge represents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EdgeKind {
    // ── Model associations ──────────────────────────────────
    BelongsTo,
    HasOne,
    HasMany,
    HasAndBelongsToMany,

    // ── Request flow ────────────────────────────────────────
    HasAction,
    RoutesTo,
    AccessesModel,
    CallsService,
    RespondsWith,

    // ── Fallback ────────────────────────────────────────────
    Other(String),
}

impl EdgeKind {
    pub fn as_str(&self) -> &str {
        match self {
            EdgeKind::BelongsTo => "belongs_to",
            EdgeKind::HasOne => "has_one",
            EdgeKind::HasMany => "has_many",
            EdgeKind::HasAndBelongsToMany => "has_and_belongs_to_many",
            EdgeKind::HasAction => "has_action",
            EdgeKind::RoutesTo => "routes_to",
            EdgeKind::AccessesModel => "accesses_model",
            EdgeKind::CallsService => "calls_service",
            EdgeKind::RespondsWith => "responds_with",
            EdgeKind::Other(tag) => tag,
        }
    }

    /// True for the four model association kinds.
    pub fn is_association(&self) -> bool {
        matches!(
            self,
            EdgeKind::BelongsTo
                | EdgeKind::HasOne
                | EdgeKind::HasMany
                | EdgeKind::HasAndBelongsToMany
        )
    }
}

impl From<&str> for EdgeKind {
    fn from(tag: &str) -> Self {
        match tag {
            "belongs_to" => EdgeKind::BelongsTo,
            "has_one" => EdgeKind::HasOne,
            "has_many" => EdgeKind::HasMany,
            "has_and_belongs_to_many" => EdgeKind::HasAndBelongsToMany,
            "has_action" => EdgeKind::HasAction,
            "routes_to" => EdgeKind::RoutesTo,
            "accesses_model" => EdgeKind::AccessesModel,
            "calls_service" => EdgeKind::CallsService,
            "responds_with" => EdgeKind::RespondsWith,
            other => EdgeKind::Other(other.to_string()),
        }
    }
}

impl From<String> for EdgeKind {
    fn from(tag: String) -> Self {
        EdgeKind::from(tag.as_str())
    }
}

impl From<EdgeKind> for String {
    fn from(kind: EdgeKind) -> Self {
        match kind {
            EdgeKind::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single node in the architecture graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    /// Caller-assigned id, stable across independent analysis runs.
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: Attributes,
    /// Where the entity was found. Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
}

impl Node {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: NodeKind) -> Self {
        Node {
            id: id.into(),
            name: name.into(),
            kind,
            attributes: Attributes::new(),
            file_path: None,
            line_number: None,
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn with_source(mut self, file_path: impl Into<PathBuf>, line_number: Option<u32>) -> Self {
        self.file_path = Some(file_path.into());
        self.line_number = line_number;
        self
    }

    /// The `path` attribute of a route node, if it is a string.
    pub fn path(&self) -> Option<&str> {
        self.attributes.get(PATH_ATTRIBUTE).and_then(|v| v.as_str())
    }

    pub fn is_model(&self) -> bool {
        self.kind == NodeKind::Model
    }

    pub fn is_controller(&self) -> bool {
        self.kind == NodeKind::Controller
    }

    pub fn is_action(&self) -> bool {
        self.kind == NodeKind::Action
    }

    pub fn is_route(&self) -> bool {
        self.kind == NodeKind::Route
    }
}

/// Identity of an edge for dedup and diffing. Label and attributes are not
/// part of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeKey {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
}

/// A directed edge. Either endpoint may name a node that is not in the graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Edge {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
    /// Human-readable label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: Attributes,
}

impl Edge {
    pub fn new(from: impl Into<String>, to: impl Into<String>, kind: EdgeKind) -> Self {
        Edge {
            from: from.into(),
            to: to.into(),
            kind,
            label: None,
            attributes: Attributes::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn key(&self) -> EdgeKey {
        EdgeKey {
            from: self.from.clone(),
            to: self.to.clone(),
            kind: self.kind.clone(),
        }
    }

    /// Whether `(from, to, type)` matches without allocating a key.
    pub fn matches(&self, key: &EdgeKey) -> bool {
        self.from == key.from && self.to == key.to && self.kind == key.kind
    }

    /// Whether `id` appears at either end.
    pub fn touches(&self, id: &str) -> bool {
        self.from == id || self.to == id
    }

    /// The endpoint opposite `id`. Self-loops return `id` itself.
    pub fn other_end(&self, id: &str) -> &str {
        if self.from == id { &self.to } else { &self.from }
    }

    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }
}

/// Run-independent id for a route: `GET /api/v1/users/:id` becomes
/// `route_get_api_v1_users_id`.
///
/// Every character outside `[A-Za-z0-9_]` turns into `_`, the result is
/// lowercased and runs of `_` collapse to one.
pub fn route_id(verb: &str, path: &str) -> String {
    let mut id = String::with_capacity(verb.len() + path.len() + 7);
    for c in format!("route_{}_{}", verb, path).chars() {
        let c = if c.is_ascii_alphanumeric() || c == '_' {
            c.to_ascii_lowercase()
        } else {
            '_'
        };
        if c == '_' && id.ends_with('_') {
            continue;
        }
        id.push(c);
    }
    id
}

/// Rails-style `underscore`: `Api::V1::UsersController` -> `api/v1/users_controller`.
fn underscore(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev: Option<char> = None;
    for c in name.replace("::", "/").chars() {
        if c.is_uppercase() {
            if prev.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit()) {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
        prev = Some(c);
    }
    out
}
