use ckgraph::GraphError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that halt a builder run
#[derive(Error, Debug)]
pub enum BuilderError {
    /// Failed to read file
    #[error("IO error reading {0}: {1}")]
    IoError(PathBuf, #[source] std::io::Error),

    /// Syntax error in source code
    #[error("Syntax error in {0}:{1}:{2}: {3}")]
    SyntaxError(PathBuf, usize, usize, String),

    /// File too large
    #[error("File {0} exceeds maximum size ({1} bytes)")]
    FileTooLarge(PathBuf, usize),

    /// File lies outside the project root
    #[error("Invalid path {0}: {1}")]
    InvalidPath(PathBuf, String),

    /// No registered builder handles the file
    #[error("No builder registered for {0}")]
    UnsupportedFile(PathBuf),

    /// Generic parsing error
    #[error("Parse error in {0}: {1}")]
    ParseError(PathBuf, String),

    /// Pipeline setup failed (thread pool, configuration)
    #[error("Pipeline error: {0}")]
    Pipeline(String),

    /// Validation, merge or snapshot failure from the graph layer
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Result type for builder operations
pub type BuilderResult<T> = Result<T, BuilderError>;
