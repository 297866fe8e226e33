//! Error Types
//!
//! Errors raised at the boundaries of the sync layer. None of these are
//! fatal to an interactive session: the store keeps its last good state and
//! the failure is logged.

use thiserror::Error;

/// Failure of the durable key-value store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing store cannot be used at all.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A write would grow the store past its byte quota.
    #[error("quota exceeded writing {key:?}: {needed} bytes needed, limit is {limit}")]
    QuotaExceeded {
        key: String,
        needed: usize,
        limit: usize,
    },

    /// Filesystem error from a file-backed store.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored value could not be encoded or decoded.
    #[error("snapshot codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Failure inside a layout engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// The input graph is not acyclic.
    #[error("graph contains a cycle through {remaining} node(s)")]
    Cycle { remaining: usize },

    /// An edge refers to a node that is not part of the input.
    #[error("edge refers to unknown node {0:?}")]
    UnknownNode(String),
}

/// Failure of a background layout job.
#[derive(Debug, Error)]
pub enum ComputeError {
    /// The layout engine rejected the input.
    #[error("layout failed: {0}")]
    Layout(#[from] LayoutError),

    /// The worker running the layout panicked.
    #[error("layout worker panicked")]
    WorkerPanicked,

    /// The worker was cancelled before it produced a result.
    #[error("layout worker cancelled")]
    Cancelled,
}

impl From<tokio::task::JoinError> for ComputeError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_panic() {
            ComputeError::WorkerPanicked
        } else {
            ComputeError::Cancelled
        }
    }
}

/// Invalid sync configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
