//! HTTP client for result pages and share-link verification.
//!
//! Every request looks like a regular browser visit from the configured
//! region: a rotating User-Agent, a matching `Accept-Language`, and a
//! cookie jar for consent interstitials. This is best-effort only; a
//! challenge page is still treated as "no result" by the callers.

use std::time::Duration;

use rand::seq::SliceRandom;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};

use crate::config::ExternalSearchConfig;
use crate::error::SearchError;

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:125.0) Gecko/20100101 Firefox/125.0",
];

const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Build a client for `config`.
///
/// The User-Agent is picked once per client, so one resolution request
/// presents a single consistent identity.
///
/// # Errors
///
/// Returns [`SearchError::Http`] if the client cannot be constructed.
pub fn build_client(config: &ExternalSearchConfig) -> Result<reqwest::Client, SearchError> {
    let ua = config
        .user_agent
        .clone()
        .unwrap_or_else(|| random_user_agent().to_owned());

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(HTML_ACCEPT));
    let language = HeaderValue::from_str(&accept_language(&config.region))
        .map_err(|e| SearchError::Config(format!("region {:?}: {e}", config.region)))?;
    headers.insert(ACCEPT_LANGUAGE, language);

    reqwest::Client::builder()
        .cookie_store(true)
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(ua)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| SearchError::Http(format!("failed to build HTTP client: {e}")))
}

/// A random entry of the built-in User-Agent list.
pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// `Accept-Language` value for a region code such as `fr-fr`.
///
/// The region's language is preferred, with English as a low-weight
/// fallback.
pub fn accept_language(region: &str) -> String {
    let mut parts = region.split('-');
    let lang = parts.next().unwrap_or("en").to_lowercase();
    match parts.next() {
        Some(country) if !country.is_empty() => {
            format!("{lang}-{},{lang};q=0.9,en;q=0.8", country.to_uppercase())
        }
        _ => format!("{lang},en;q=0.8"),
    }
}
