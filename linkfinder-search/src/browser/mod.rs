//! Rendering-engine seam.
//!
//! Target sites hydrate their content client-side, so pages are loaded in a
//! real browser. The crawler and the navigator are written against the
//! [`Renderer`] / [`PageSession`] traits; [`ChromiumRenderer`] drives a
//! headless Chromium over CDP, and tests substitute an in-memory fake.
//!
//! One session is one isolated browsing context, acquired per resolution
//! request and never shared. Callers must [`PageSession::close`] it on
//! every exit path.

use std::future::Future;
use std::time::Duration;

use crate::error::{Result, SearchError};

pub mod chromium;
#[cfg(test)]
pub(crate) mod fake;

pub use chromium::{ChromiumRenderer, ChromiumSession};

/// Outcome of a successful top-level navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    /// HTTP status of the document, when the engine reports it.
    pub status: Option<u16>,
    /// URL after redirects.
    pub final_url: String,
}

/// One isolated browsing context with a single tab.
///
/// Every operation carries its own timeout. Operations on one session are
/// strictly sequential (`&mut self`).
pub trait PageSession: Send {
    /// Load `url` and wait for it to settle.
    ///
    /// # Errors
    ///
    /// [`SearchError::NavigationTimeout`] when `timeout` elapses, and
    /// [`SearchError::NavigationFailed`] when the page is unreachable or
    /// answers with a status of 400 or above.
    fn navigate(
        &mut self,
        url: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<Navigation>> + Send;

    /// Serialised DOM of the current page.
    fn html(&mut self) -> impl Future<Output = Result<String>> + Send;

    /// URL of the current page.
    fn current_url(&mut self) -> impl Future<Output = Result<String>> + Send;

    /// Type `text` into the element matched by `selector`, submit it, and
    /// wait (up to `timeout`) for the resulting navigation.
    fn submit_search(
        &mut self,
        selector: &str,
        text: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Choose option `index` of the `<select>` matched by `selector`, fire
    /// its change event, then wait `settle` for the page to react.
    fn select_option(
        &mut self,
        selector: &str,
        index: usize,
        settle: Duration,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Release the context and everything it holds. Never fails.
    fn close(self) -> impl Future<Output = ()> + Send;
}

/// Factory for fresh, isolated sessions.
pub trait Renderer: Send + Sync {
    /// Session type produced by this renderer.
    type Session: PageSession;

    /// Acquire a new browsing context.
    ///
    /// # Errors
    ///
    /// [`SearchError::Browser`] if the engine cannot be started.
    fn open_session(&self) -> impl Future<Output = Result<Self::Session>> + Send;
}

/// Reject document statuses that mean "no content here".
pub(crate) fn check_status(url: &str, status: Option<u16>) -> Result<()> {
    match status {
        Some(code) if code >= 400 => Err(SearchError::NavigationFailed(format!(
            "{url} returned {code}"
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_and_redirect_statuses_pass() {
        assert!(check_status("https://a.com", Some(200)).is_ok());
        assert!(check_status("https://a.com", Some(304)).is_ok());
        assert!(check_status("https://a.com", None).is_ok());
    }

    #[test]
    fn error_statuses_fail_navigation() {
        let err = check_status("https://a.com", Some(503)).unwrap_err();
        assert!(err.is_navigation());
        assert_eq!(err.to_string(), "navigation failed: https://a.com returned 503");
    }

    #[test]
    fn chromium_renderer_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ChromiumRenderer>();
    }
}
