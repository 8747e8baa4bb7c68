//! # linkfinder-search
//!
//! Link resolution engine for linkfinder.
//!
//! Given a site (or a provider alias), a keyword, and optionally an episode
//! number, finds the single best reachable link: a page on the site, or a
//! share link on the video provider.
//!
//! ## Design
//!
//! - Bounded same-domain crawler over a real rendering engine (sites
//!   hydrate client-side)
//! - Shared relevance scorer and deduplicator for crawled pages and public
//!   search results
//! - Provider links are only ever found through public search, because the
//!   provider answers automated in-site search with a challenge
//! - Episode/player navigator for the multi-step catalogue site, driven by
//!   per-site selector tables
//! - One isolated browser session per request; nothing is shared between
//!   requests except read-only configuration
//!
//! ## Security
//!
//! - No network listeners, no persistence of results
//! - Queries are logged only at trace level

pub mod browser;
pub mod config;
pub mod content;
pub mod crawler;
pub mod engine;
pub mod engines;
pub mod error;
pub mod external;
pub mod http;
pub mod navigator;
pub mod orchestrator;
pub mod provider;
pub mod types;

pub use browser::{ChromiumRenderer, PageSession, Renderer};
pub use config::SearchConfig;
pub use engine::SearchEngineTrait;
pub use engines::DuckDuckGoEngine;
pub use error::{Result, SearchError};
pub use orchestrator::resolve::{episode_from_text, Resolver};
pub use provider::ProviderLinkNormalizer;
pub use types::{
    Candidate, EpisodeSelection, NavState, NavigationOutcome, PlayerCandidate, ResolutionResult,
    ResolutionSource,
};

/// Resolver backed by headless Chromium and DuckDuckGo.
pub type DefaultResolver = Resolver<ChromiumRenderer, DuckDuckGoEngine>;

/// Build the production resolver for `config`.
///
/// No browser is launched until a request needs one.
///
/// # Errors
///
/// Returns [`SearchError::Config`] if `config` is invalid.
pub fn default_resolver(config: SearchConfig) -> Result<DefaultResolver> {
    Resolver::new(
        ChromiumRenderer::new(config.browser.clone()),
        DuckDuckGoEngine::new(config.external.clone()),
        config,
    )
}

/// Resolve `keyword` on `site_or_alias` to one link.
///
/// Never fails for "nothing found": that is a result with
/// `source = none` and a reason.
///
/// # Errors
///
/// Returns [`SearchError::Config`] if `config` is invalid.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> linkfinder_search::Result<()> {
/// let config = linkfinder_search::SearchConfig::default();
/// let result = linkfinder_search::resolve("sibnet", "one piece 1089", None, &config).await?;
/// println!("{}: {}", result.source, result.link);
/// # Ok(())
/// # }
/// ```
pub async fn resolve(
    site_or_alias: &str,
    keyword: &str,
    episode: Option<u32>,
    config: &SearchConfig,
) -> Result<ResolutionResult> {
    let resolver = default_resolver(config.clone())?;
    Ok(resolver.resolve(site_or_alias, keyword, episode).await)
}

/// Crawl `url` for `query` and return the `top_k` best pages.
///
/// # Errors
///
/// Returns [`SearchError::Config`] for an invalid configuration,
/// [`SearchError::MalformedUrl`] for a bad URL, or the first navigation
/// error when no page of the site could be loaded.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> linkfinder_search::Result<()> {
/// let config = linkfinder_search::SearchConfig::default();
/// for page in linkfinder_search::crawl_site("anime-site.example", "one piece", 3, &config).await? {
///     println!("{:.1} {} {}", page.score, page.title, page.url);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn crawl_site(
    url: &str,
    query: &str,
    top_k: usize,
    config: &SearchConfig,
) -> Result<Vec<Candidate>> {
    config.validate()?;
    let renderer = ChromiumRenderer::new(config.browser.clone());
    crawler::crawl_site(&renderer, url, query, top_k, config).await
}

/// Turbo path on the multi-step site; see [`Resolver::fast_resolve`].
///
/// # Errors
///
/// Returns [`SearchError::Config`] if `config` is invalid.
pub async fn fast_resolve(
    query: &str,
    direct_url: Option<&str>,
    config: &SearchConfig,
) -> Result<NavigationOutcome> {
    let resolver = default_resolver(config.clone())?;
    Ok(resolver.fast_resolve(query, direct_url).await)
}

/// Rewrite a provider URL into its canonical share link, or `None` when it
/// does not reference the provider. No network access.
///
/// # Examples
///
/// ```
/// let config = linkfinder_search::SearchConfig::default();
/// assert_eq!(
///     linkfinder_search::normalize_url("https://video.sibnet.ru/frame.php?videoid=9", &config).as_deref(),
///     Some("https://video.sibnet.ru/video9"),
/// );
/// ```
pub fn normalize_url(url: &str, config: &SearchConfig) -> Option<String> {
    ProviderLinkNormalizer::new(config.provider.clone()).normalize(url)
}
