//! Trait definition for pluggable external search backends.
//!
//! The resolver and the navigator's fallback only need "run this query on
//! a public search engine and give me the hits". [`SearchEngineTrait`] is
//! that seam; [`crate::engines::DuckDuckGoEngine`] is the production
//! implementation and tests substitute canned engines.

use crate::error::SearchError;
use crate::types::Candidate;

/// A public search engine whose result page can be scraped.
///
/// Implementors own their configuration (endpoint, region, timeouts) and
/// handle their own:
///
/// - URL construction with query encoding
/// - HTTP request with appropriate headers
/// - HTML parsing via CSS selectors
/// - Unwrapping of redirect-wrapped result links
///
/// Returned candidates are unscored and in page order, with duplicate
/// destinations removed. All implementations must be `Send + Sync` so one
/// engine can serve concurrent resolution requests.
pub trait SearchEngineTrait: Send + Sync {
    /// Run `query` verbatim (operators such as `site:` included).
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the request fails or the engine
    /// answers with a non-success status, or [`SearchError::Parse`] if the
    /// result page cannot be parsed.
    fn search(
        &self,
        query: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Candidate>, SearchError>> + Send;

    /// Human-readable engine name used in logs.
    fn name(&self) -> &'static str;
}
