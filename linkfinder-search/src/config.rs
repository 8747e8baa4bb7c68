//! Resolution configuration with sensible defaults.
//!
//! [`SearchConfig`] bundles every knob the resolution engine reads: crawl
//! bounds, score thresholds, external search behaviour, rendering-engine
//! presentation, and the target provider's identity. It is read-only for the
//! lifetime of a request and may be shared freely between concurrent ones.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// Path fragments that mark non-content pages (auth, legal, account, feeds).
const DEFAULT_DENIED_PATH_HINTS: &[&str] = &[
    "login",
    "signin",
    "register",
    "signup",
    "privacy",
    "cookie",
    "terms",
    "conditions",
    "help",
    "aide",
    "support",
    "profil",
    "profile",
    "account",
    "settings",
    "rss",
    "feed",
];

/// Desktop Chrome User-Agent presented by the rendering engine.
const DEFAULT_BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Top-level configuration for link resolution.
///
/// Use [`Default::default()`] for sensible defaults, or construct with
/// field overrides for custom behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Bounds for the same-domain crawler.
    pub crawl: CrawlConfig,
    /// Relevance thresholds shared by the crawler and external search.
    pub thresholds: ScoreThresholds,
    /// Public search engine used for `site:` scoped lookups.
    pub external: ExternalSearchConfig,
    /// Rendering-engine presentation parameters.
    pub browser: BrowserConfig,
    /// Identity of the video provider with bespoke link handling.
    pub provider: ProviderConfig,
    /// Domain of the site whose pages expose episode/player pickers.
    pub multi_step_site: String,
    /// How many candidates a `find` style query returns.
    pub results_per_query: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            crawl: CrawlConfig::default(),
            thresholds: ScoreThresholds::default(),
            external: ExternalSearchConfig::default(),
            browser: BrowserConfig::default(),
            provider: ProviderConfig::default(),
            multi_step_site: "anime-sama.fr".into(),
            results_per_query: 3,
        }
    }
}

/// Crawl bounds. Every crawl owns its own state; these are limits only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Maximum number of distinct canonical URLs visited per crawl.
    pub max_pages: usize,
    /// Maximum hops from an entry point.
    pub max_depth: usize,
    /// Per-page navigation timeout in milliseconds.
    pub page_timeout_ms: u64,
    /// Maximum number of candidates a crawl returns.
    pub max_candidates: usize,
    /// Lowercase path fragments that are never enqueued nor reported.
    pub denied_path_hints: Vec<String>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: 60,
            max_depth: 2,
            page_timeout_ms: 15_000,
            max_candidates: 10,
            denied_path_hints: DEFAULT_DENIED_PATH_HINTS
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
        }
    }
}

impl CrawlConfig {
    /// Per-page timeout as a [`Duration`].
    pub fn page_timeout(&self) -> Duration {
        Duration::from_millis(self.page_timeout_ms)
    }
}

/// Score thresholds on the 0–100 similarity scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreThresholds {
    /// Minimum title similarity for a strong candidate.
    pub strong_candidate: f64,
    /// Minimum snippet similarity for a strong candidate (when a snippet exists).
    pub snippet_min: f64,
    /// Minimum title+heading similarity for a crawled page to be relevant.
    pub page_relevance: f64,
    /// Title similarity at or above which two candidates are duplicates.
    pub duplicate_title: f64,
}

impl Default for ScoreThresholds {
    fn default() -> Self {
        Self {
            strong_candidate: 85.0,
            snippet_min: 70.0,
            page_relevance: 85.0,
            duplicate_title: 95.0,
        }
    }
}

/// External (public) search engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalSearchConfig {
    /// HTML result page endpoint.
    pub endpoint: String,
    /// Region/locale hint passed as the `kl` parameter.
    pub region: String,
    /// HTTP request timeout in seconds.
    pub timeout_seconds: u64,
    /// Maximum number of parsed hits per result page.
    pub max_hits: usize,
    /// Custom User-Agent string. If `None`, rotates through a built-in list.
    pub user_agent: Option<String>,
}

impl Default for ExternalSearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://duckduckgo.com/html/".into(),
            region: "fr-fr".into(),
            timeout_seconds: 15,
            max_hits: 30,
            user_agent: None,
        }
    }
}

/// Rendering-engine presentation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run without a visible window.
    pub headless: bool,
    /// Browser UI / `Accept-Language` locale.
    pub locale: String,
    /// User-Agent presented by every page.
    pub user_agent: String,
    /// Window size `(width, height)`.
    pub viewport: (u32, u32),
    /// Accept invalid TLS certificates on target sites.
    pub ignore_https_errors: bool,
    /// Wait after choosing an episode before reading the page again.
    pub episode_settle_ms: u64,
    /// Wait after choosing a player before reading the frame.
    pub player_settle_ms: u64,
    /// Timeout for in-page actions (select, type, evaluate).
    pub action_timeout_ms: u64,
    /// Explicit Chrome/Chromium executable. Auto-detected when `None`.
    pub executable: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            locale: "fr-FR".into(),
            user_agent: DEFAULT_BROWSER_USER_AGENT.into(),
            viewport: (1366, 768),
            ignore_https_errors: true,
            episode_settle_ms: 1_000,
            player_settle_ms: 2_000,
            action_timeout_ms: 10_000,
            executable: None,
        }
    }
}

impl BrowserConfig {
    /// In-page action timeout as a [`Duration`].
    pub fn action_timeout(&self) -> Duration {
        Duration::from_millis(self.action_timeout_ms)
    }
}

/// The video provider that blocks in-site search and needs link rewriting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Literal alias users type instead of a site (e.g. `sibnet`).
    pub alias: String,
    /// Host of canonical share links.
    pub host: String,
    /// Case-insensitive marker identifying any provider URL.
    pub marker: String,
    /// Fetch a rewritten share link once before returning it.
    pub verify_links: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            alias: "sibnet".into(),
            host: "video.sibnet.ru".into(),
            marker: "sibnet".into(),
            verify_links: false,
        }
    }
}

impl SearchConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - crawl bounds (`max_pages`, `page_timeout_ms`, `max_candidates`) are non-zero
    /// - `results_per_query` is non-zero
    /// - thresholds lie within `0..=100`
    /// - external endpoint parses as an http(s) URL
    /// - provider host and marker are non-empty
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.crawl.max_pages == 0 {
            return Err(SearchError::Config(
                "crawl.max_pages must be greater than 0".into(),
            ));
        }
        if self.crawl.page_timeout_ms == 0 {
            return Err(SearchError::Config(
                "crawl.page_timeout_ms must be greater than 0".into(),
            ));
        }
        if self.crawl.max_candidates == 0 {
            return Err(SearchError::Config(
                "crawl.max_candidates must be greater than 0".into(),
            ));
        }
        if self.results_per_query == 0 {
            return Err(SearchError::Config(
                "results_per_query must be greater than 0".into(),
            ));
        }
        if self.external.timeout_seconds == 0 {
            return Err(SearchError::Config(
                "external.timeout_seconds must be greater than 0".into(),
            ));
        }
        let thresholds = [
            ("strong_candidate", self.thresholds.strong_candidate),
            ("snippet_min", self.thresholds.snippet_min),
            ("page_relevance", self.thresholds.page_relevance),
            ("duplicate_title", self.thresholds.duplicate_title),
        ];
        for (name, value) in thresholds {
            if !(0.0..=100.0).contains(&value) {
                return Err(SearchError::Config(format!(
                    "thresholds.{name} must be within 0..=100"
                )));
            }
        }
        match url::Url::parse(&self.external.endpoint) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => {}
            _ => {
                return Err(SearchError::Config(
                    "external.endpoint must be an http(s) URL".into(),
                ));
            }
        }
        if self.provider.host.is_empty() || self.provider.marker.is_empty() {
            return Err(SearchError::Config(
                "provider host and marker must not be empty".into(),
            ));
        }
        Ok(())
    }
}
