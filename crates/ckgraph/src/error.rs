//! Error types for ckgraph operations.
//!
//! All fallible operations return [`Result<T>`] with context-rich error messages.
//! Recoverable conditions in the analyzed code (unresolved calls, dropped
//! orphan edges) never surface here; they are recorded as
//! [`Ambiguity`](crate::Ambiguity) entries in the graph instead.

use crate::validate::Violation;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for ckgraph operations.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Error type for graph construction, validation and queries.
#[derive(Error, Debug)]
pub enum GraphError {
    /// Node not found in the graph
    #[error("Node not found: {node_id}")]
    NodeNotFound {
        /// ID of the missing node
        node_id: String,
    },

    /// Traversal depth outside the accepted range
    #[error("Invalid depth {depth}: traversal depth must be at least 1")]
    InvalidDepth {
        /// The rejected depth
        depth: usize,
    },

    /// A fragment broke the schema contract; the build must stop
    #[error("Schema violation in {source_file}: {} violation(s)", .violations.len())]
    SchemaViolation {
        /// File whose fragment was rejected
        source_file: String,
        /// Every violation found in the fragment
        violations: Vec<Violation>,
    },

    /// An enriched graph no longer matches the graph it was derived from
    #[error("Structural mismatch: {summary}")]
    StructuralMismatch {
        /// Human readable difference summary
        summary: String,
    },

    /// File referenced by a node does not exist on disk
    #[error("File not found: {path}")]
    FileNotFound {
        /// Path to the missing file
        path: PathBuf,
    },

    /// I/O failure while reading or writing graph data
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Invalid operation (e.g., re-initializing the schema)
    #[error("Invalid operation: {message}")]
    InvalidOperation {
        /// Description of what went wrong
        message: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error details
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl GraphError {
    /// Create a node-not-found error.
    pub fn node_not_found(node_id: impl Into<String>) -> Self {
        GraphError::NodeNotFound {
            node_id: node_id.into(),
        }
    }

    /// Create an invalid-operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        GraphError::InvalidOperation {
            message: message.into(),
        }
    }

    /// Create a serialization error with optional source.
    pub fn serialization<E>(message: impl Into<String>, source: Option<E>) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        GraphError::Serialization {
            message: message.into(),
            source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        }
    }

    /// Create an I/O error bound to a path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GraphError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for GraphError {
    fn from(err: serde_json::Error) -> Self {
        GraphError::serialization("JSON (de)serialization failed", Some(err))
    }
}
