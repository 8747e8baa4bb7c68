//! DuckDuckGo search engine, HTML-only result page.
//!
//! Uses the HTML version at `https://duckduckgo.com/html/`, which needs no
//! JavaScript. Result anchors are often wrapped in a `/l/?uddg=` redirect
//! that carries the true destination; those are unwrapped during parsing.

use std::collections::HashSet;

use crate::config::ExternalSearchConfig;
use crate::engine::SearchEngineTrait;
use crate::error::SearchError;
use crate::http;
use crate::types::Candidate;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Result-block selectors, in priority order.
const BLOCK_SELECTORS: &[&str] = &[".result", ".web-result", ".results_links"];

/// Anchor selectors tried inside each block, first match wins.
const LINK_SELECTORS: &[&str] = &[".result__a", "h2 a", ".result-link", "a"];

/// DuckDuckGo HTML search engine scraper.
#[derive(Debug, Clone)]
pub struct DuckDuckGoEngine {
    config: ExternalSearchConfig,
}

impl DuckDuckGoEngine {
    /// Create an engine with the given endpoint and request settings.
    pub fn new(config: ExternalSearchConfig) -> Self {
        Self { config }
    }

    /// Extract the actual URL from DuckDuckGo's redirect wrapper.
    ///
    /// DDG wraps URLs like: `//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com&rut=...`
    /// We parse out the `uddg` query parameter and URL-decode it. Direct
    /// links are returned as-is; anything that is not an absolute URL is
    /// rejected.
    pub(crate) fn extract_url(href: &str) -> Option<String> {
        let full_href = if href.starts_with("//") {
            format!("https:{href}")
        } else if href.starts_with("/l/") {
            format!("https://duckduckgo.com{href}")
        } else {
            href.to_string()
        };

        let parsed = Url::parse(&full_href).ok()?;
        let is_ddg = parsed
            .host_str()
            .is_some_and(|h| h == "duckduckgo.com" || h.ends_with(".duckduckgo.com"));

        if is_ddg && parsed.path().starts_with("/l/") {
            parsed
                .query_pairs()
                .find(|(key, _)| key == "uddg")
                .map(|(_, value)| value.into_owned())
        } else if matches!(parsed.scheme(), "http" | "https") {
            Some(full_href)
        } else {
            None
        }
    }
}

impl SearchEngineTrait for DuckDuckGoEngine {
    async fn search(&self, query: &str) -> Result<Vec<Candidate>, SearchError> {
        tracing::trace!(query, "DuckDuckGo search");

        let client = http::build_client(&self.config)?;

        let response = client
            .get(&self.config.endpoint)
            .query(&[("q", query), ("kl", self.config.region.as_str())])
            .send()
            .await
            .map_err(|e| SearchError::Http(format!("DuckDuckGo request failed: {e}")))?
            .error_for_status()
            .map_err(|e| SearchError::Http(format!("DuckDuckGo HTTP error: {e}")))?;

        let html = response
            .text()
            .await
            .map_err(|e| SearchError::Http(format!("DuckDuckGo response read failed: {e}")))?;

        tracing::trace!(bytes = html.len(), "DuckDuckGo response received");

        parse_duckduckgo_html(&html, self.config.max_hits)
    }

    fn name(&self) -> &'static str {
        "DuckDuckGo"
    }
}

/// Parse a DuckDuckGo HTML result page into unscored candidates.
///
/// Blocks are visited per selector in [`BLOCK_SELECTORS`] order; inside a
/// block the first [`LINK_SELECTORS`] match with an `href` is the hit.
/// Ads are skipped and each destination URL is kept once.
pub(crate) fn parse_duckduckgo_html(
    html: &str,
    max_hits: usize,
) -> Result<Vec<Candidate>, SearchError> {
    let document = Html::parse_document(html);

    let blocks = parse_selectors(BLOCK_SELECTORS)?;
    let links = parse_selectors(LINK_SELECTORS)?;
    let snippet_sel = Selector::parse(".result__snippet")
        .map_err(|e| SearchError::Parse(format!("invalid snippet selector: {e:?}")))?;

    let mut seen: HashSet<String> = HashSet::new();
    let mut hits = Vec::new();

    'outer: for block_sel in &blocks {
        for block in document.select(block_sel) {
            if block.value().classes().any(|c| c == "result--ad") {
                continue;
            }
            let Some((title, url)) = first_link(block, &links) else {
                continue;
            };
            if !seen.insert(url.clone()) {
                continue;
            }

            let snippet = block
                .select(&snippet_sel)
                .next()
                .map(collapse_text)
                .unwrap_or_default();

            hits.push(Candidate::new(title, url, snippet));
            if hits.len() >= max_hits {
                break 'outer;
            }
        }
    }

    tracing::debug!(count = hits.len(), "DuckDuckGo results parsed");
    Ok(hits)
}

fn parse_selectors(raw: &[&str]) -> Result<Vec<Selector>, SearchError> {
    raw.iter()
        .map(|s| {
            Selector::parse(s)
                .map_err(|e| SearchError::Parse(format!("invalid selector {s}: {e:?}")))
        })
        .collect()
}

fn first_link(block: ElementRef<'_>, links: &[Selector]) -> Option<(String, String)> {
    for sel in links {
        let Some(anchor) = block.select(sel).next() else {
            continue;
        };
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if let Some(url) = DuckDuckGoEngine::extract_url(href) {
            return Some((collapse_text(anchor), url));
        }
    }
    None
}

fn collapse_text(el: ElementRef<'_>) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
