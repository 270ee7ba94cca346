//! Error type shared by the core operations

use thiserror::Error;

/// Failures the core reports to callers.
///
/// A missing node, an unmatched endpoint or a dangling edge is not an error:
/// those resolve to `None` or an empty result.
#[derive(Error, Debug)]
pub enum FlowError {
    /// Something that is not a graph was passed where one was expected.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, FlowError>;
