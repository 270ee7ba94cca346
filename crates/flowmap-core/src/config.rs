//! Tunable thresholds for the diff engine and the complexity analyzer

use crate::error::{FlowError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration, usually read from a `flowmap.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    pub diff: DiffConfig,
    pub analysis: AnalysisConfig,
}

impl FlowConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| FlowError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!("Configuration loaded from: {}", path.display());
        Ok(config)
    }
}

/// Thresholds behind the diff summary recommendations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// More added nodes than this suggests splitting the change.
    pub large_change_nodes: usize,
    /// Complexity growth (percent) above which refactoring is suggested.
    pub complexity_increase_percent: f64,
    /// Added edges beyond `ratio × added nodes` hint at circular dependencies.
    pub edge_to_node_ratio: usize,
}

impl Default for DiffConfig {
    fn default() -> Self {
        DiffConfig {
            large_change_nodes: 10,
            complexity_increase_percent: 20.0,
            edge_to_node_ratio: 2,
        }
    }
}

/// Thresholds and list sizes for the metrics report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Models with a complexity score above this are god objects.
    pub god_object_threshold: usize,
    /// The most connected model above this should be broken down.
    pub overloaded_model_threshold: usize,
    /// Controllers with more actions than this are flagged.
    pub fat_controller_actions: usize,
    /// Without services, more controllers than this suggests a service layer.
    pub service_layer_controllers: usize,
    /// Length of the ranked lists in a report.
    pub top_n: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            god_object_threshold: 10,
            overloaded_model_threshold: 15,
            fat_controller_actions: 7,
            service_layer_controllers: 5,
            top_n: 5,
        }
    }
}
