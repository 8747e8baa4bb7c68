//! Bounded, same-domain, breadth-first site crawler.
//!
//! Starts from the site root plus a handful of conventional search URLs,
//! renders each page, and keeps the pages whose title and heading match
//! the query. Traversal state lives in a [`CrawlState`] owned by one call.
//!
//! # Bounds
//!
//! - at most `max_pages` distinct canonical URLs are visited
//! - links are followed at most `max_depth` hops from an entry point
//! - only the base domain (and its subdomains) is ever visited
//! - paths containing a denylisted hint are never enqueued or reported

use std::collections::{HashSet, VecDeque};

use url::Url;

use crate::browser::{PageSession, Renderer};
use crate::config::{CrawlConfig, ScoreThresholds, SearchConfig};
use crate::content::summarize_page;
use crate::error::{Result, SearchError};
use crate::orchestrator::dedup::deduplicate;
use crate::orchestrator::scoring::{relevance_score, sort_by_score};
use crate::orchestrator::similarity::{contains_whole_word, token_set_ratio};
use crate::orchestrator::url_normalize::{canonicalize, registrable_host, same_domain};
use crate::types::Candidate;

/// Traversal state of one crawl. Never shared between crawls.
#[derive(Debug, Default)]
pub struct CrawlState {
    /// Canonical URLs already attempted, successful or not.
    pub visited: HashSet<String>,
    /// Pending `(canonical url, depth)` pairs in discovery order.
    pub queue: VecDeque<(String, usize)>,
}

impl CrawlState {
    fn seeded(entries: Vec<String>) -> Self {
        Self {
            visited: HashSet::new(),
            queue: entries.into_iter().map(|u| (u, 0)).collect(),
        }
    }
}

/// Canonical entry URLs for `base_url`: the root and common search paths.
///
/// Order is root, `/?s=`, `/search?q=`, `/recherche?q=`, `/search/<q>`, with
/// duplicates removed.
///
/// # Errors
///
/// [`SearchError::MalformedUrl`] if `base_url` is not an http(s) URL.
pub fn entry_points(base_url: &str, query: &str) -> Result<Vec<String>> {
    let parsed = Url::parse(base_url.trim())
        .map_err(|e| SearchError::MalformedUrl(format!("{base_url}: {e}")))?;
    let canonical_base = canonicalize(base_url)?;
    let root = match parsed.port() {
        Some(port) => format!("{}://{}:{port}", parsed.scheme(), registrable_root(&parsed)),
        None => format!("{}://{}", parsed.scheme(), registrable_root(&parsed)),
    };
    let q: String = url::form_urlencoded::byte_serialize(query.trim().as_bytes()).collect();

    let raw = [
        canonical_base,
        format!("{root}/"),
        format!("{root}/?s={q}"),
        format!("{root}/search?q={q}"),
        format!("{root}/recherche?q={q}"),
        format!("{root}/search/{q}"),
    ];

    let mut entries: Vec<String> = Vec::with_capacity(raw.len());
    for url in raw {
        let canonical = canonicalize(&url)?;
        if !entries.contains(&canonical) {
            entries.push(canonical);
        }
    }
    Ok(entries)
}

fn registrable_root(parsed: &Url) -> String {
    parsed.host_str().unwrap_or_default().to_lowercase()
}

/// Whether the path of `url` contains any denylisted hint.
pub fn is_denied_path(url: &str, hints: &[String]) -> bool {
    let path = Url::parse(url)
        .map(|u| u.path().to_lowercase())
        .unwrap_or_else(|_| url.to_lowercase());
    hints.iter().any(|h| !h.is_empty() && path.contains(h.as_str()))
}

/// A page is relevant when the query is a whole word in its title and
/// heading, the combined text is similar enough, and its path is allowed.
fn page_is_relevant(
    title: &str,
    heading: &str,
    url: &str,
    query: &str,
    min_similarity: f64,
    hints: &[String],
) -> bool {
    let text = format!("{title} {heading}");
    contains_whole_word(&text, query)
        && token_set_ratio(&text, query) >= min_similarity
        && !is_denied_path(url, hints)
}

/// Crawl `base_url` inside an already-open session.
///
/// Failed pages (timeouts, error statuses, unreadable DOM) are marked
/// visited and skipped. Results are scored, sorted descending,
/// deduplicated, and truncated to `config.max_candidates`.
///
/// # Errors
///
/// [`SearchError::MalformedUrl`] for a bad base URL. If every attempted
/// page failed, the first failure is returned.
pub async fn crawl<S: PageSession>(
    session: &mut S,
    base_url: &str,
    query: &str,
    config: &CrawlConfig,
    thresholds: &ScoreThresholds,
) -> Result<Vec<Candidate>> {
    let base = canonicalize(base_url)?;
    let base_domain = registrable_host(&base)
        .ok_or_else(|| SearchError::MalformedUrl(format!("{base_url}: missing host")))?;

    let mut state = CrawlState::seeded(entry_points(&base, query)?);
    let mut results: Vec<Candidate> = Vec::new();
    let mut loaded = 0usize;
    let mut first_error: Option<SearchError> = None;

    tracing::info!(base = %base, query, max_pages = config.max_pages, "crawl started");

    while state.visited.len() < config.max_pages {
        let Some((url, depth)) = state.queue.pop_front() else {
            break;
        };
        if state.visited.contains(&url) || !same_domain(&url, &base_domain) {
            continue;
        }
        state.visited.insert(url.clone());

        let page = match session.navigate(&url, config.page_timeout()).await {
            Ok(nav) => session.html().await.map(|html| (nav, html)),
            Err(e) => Err(e),
        };
        let (nav, html) = match page {
            Ok(page) => page,
            Err(e) => {
                tracing::debug!(url, error = %e, "page skipped");
                first_error.get_or_insert(e);
                continue;
            }
        };
        loaded += 1;

        let summary = summarize_page(&html, &nav.final_url);
        if page_is_relevant(
            &summary.title,
            &summary.heading,
            &url,
            query,
            thresholds.page_relevance,
            &config.denied_path_hints,
        ) {
            let title = [&summary.title, &summary.heading]
                .into_iter()
                .find(|t| !t.is_empty())
                .cloned()
                .unwrap_or_else(|| url.clone());
            let score = relevance_score(query, &title, &summary.description, &url);
            tracing::debug!(url, score, "relevant page");
            results.push(Candidate {
                score,
                ..Candidate::new(title, url.clone(), summary.description.clone())
            });
        }

        if depth < config.max_depth {
            for link in summary.links {
                if !state.visited.contains(&link)
                    && same_domain(&link, &base_domain)
                    && !is_denied_path(&link, &config.denied_path_hints)
                {
                    state.queue.push_back((link, depth + 1));
                }
            }
        }
    }

    if loaded == 0 {
        if let Some(e) = first_error {
            tracing::warn!(base = %base, error = %e, "crawl reached no page");
            return Err(e);
        }
    }

    sort_by_score(&mut results);
    let mut results = deduplicate(results, thresholds.duplicate_title);
    results.truncate(config.max_candidates);
    tracing::info!(
        base = %base,
        visited = state.visited.len(),
        found = results.len(),
        "crawl finished"
    );
    Ok(results)
}

/// Crawl a site in a fresh rendering session and return the `top_k` best
/// candidates.
///
/// A missing scheme defaults to `https://`. The session is closed on every
/// exit path.
///
/// # Errors
///
/// Same as [`crawl`], plus [`SearchError::Browser`] if no session could be
/// opened.
pub async fn crawl_site<R: Renderer>(
    renderer: &R,
    url: &str,
    query: &str,
    top_k: usize,
    config: &SearchConfig,
) -> Result<Vec<Candidate>> {
    let trimmed = url.trim().trim_end_matches('/');
    let base = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_owned()
    } else {
        format!("https://{trimmed}")
    };

    let mut session = renderer.open_session().await?;
    let outcome = crawl(&mut session, &base, query, &config.crawl, &config.thresholds).await;
    session.close().await;

    let mut candidates = outcome?;
    candidates.truncate(top_k);
    Ok(candidates)
}
