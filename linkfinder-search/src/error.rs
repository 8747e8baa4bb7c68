//! Error types for the linkfinder-search crate.
//!
//! All errors use stable string messages suitable for display to users
//! and programmatic handling. "Nothing found" is never an error here: it is
//! reported through result values (`Option`, empty lists, or a
//! [`crate::types::ResolutionResult`] with `source = none`).

/// Errors that can occur while resolving a link.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The input URL could not be parsed or does not use http/https.
    #[error("malformed URL: {0}")]
    MalformedUrl(String),

    /// A page navigation did not complete within its timeout.
    #[error("navigation timed out: {0}")]
    NavigationTimeout(String),

    /// A page was unreachable or answered with a non-success status.
    #[error("navigation failed: {0}")]
    NavigationFailed(String),

    /// The rendering engine could not be launched or misbehaved.
    #[error("browser error: {0}")]
    Browser(String),

    /// An HTTP request to the external search engine failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Failed to parse an HTML document or selector.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid search configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl SearchError {
    /// Whether this error means "this page contributes nothing" rather than
    /// a problem with the request itself.
    pub fn is_navigation(&self) -> bool {
        matches!(self, Self::NavigationTimeout(_) | Self::NavigationFailed(_))
    }
}

/// Convenience type alias for linkfinder-search results.
pub type Result<T> = std::result::Result<T, SearchError>;
