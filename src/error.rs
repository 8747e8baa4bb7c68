//! Error types for the linkfinder front-end.

use linkfinder_search::SearchError;

/// Top-level error type for command handling.
#[derive(Debug, thiserror::Error)]
pub enum LinkfinderError {
    /// Configuration file or override error.
    #[error("config error: {0}")]
    Config(String),

    /// A command could not be parsed or its arguments are invalid.
    #[error("usage error: {0}")]
    Usage(String),

    /// Resolution engine error.
    #[error(transparent)]
    Search(#[from] SearchError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, LinkfinderError>;
