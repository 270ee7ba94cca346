//! Flowmap Core: architecture graph model, subgraph extraction, diff engine
//! and complexity analysis

pub mod model;
pub mod graph;
pub mod snapshot;
pub mod extract;
pub mod diff;
pub mod analysis;
pub mod config;
pub mod error;


#[cfg(test)]
pub mod test_utils;

pub use model::{Attributes, NodeKind, EdgeKind, EdgeKey, Node, Edge, route_id, PATH_ATTRIBUTE, ASSOCIATIONS_ATTRIBUTE};
pub use graph::{FlowGraph, EdgeDirection};
pub use snapshot::GraphSnapshot;
pub use extract::{extract_endpoint, find_route, connected_component, Extraction, MatchedRoute, MatchStrategy};
pub use diff::{DiffEngine, GraphDiff, NodeChange, NodeModification, ChangeStatus, MetricsChange, DiffSummary};
pub use analysis::{ComplexityAnalyzer, MetricsReport, NodeScore, DependencyBreakdown, complexity_score, detect_cycles};
pub use config::{FlowConfig, DiffConfig, AnalysisConfig};
pub use error::{FlowError, Result};
