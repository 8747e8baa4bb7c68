//! HTML extraction from rendered pages.
//!
//! Every function here is pure: it takes a serialised DOM (as returned by a
//! [`crate::browser::PageSession`]) and reads the few things the crawler and
//! the navigator care about. Nothing is fetched or mutated.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::orchestrator::url_normalize::canonicalize;

/// Maximum characters kept from a fallback first paragraph.
pub const PARAGRAPH_FALLBACK_CHARS: usize = 300;

/// What the crawler reads from one rendered page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSummary {
    /// Text of `<title>`, whitespace-collapsed.
    pub title: String,
    /// Text of the first `<h1>`.
    pub heading: String,
    /// Meta description, or the start of the first paragraph.
    pub description: String,
    /// Absolute, canonical http(s) link targets in document order, deduplicated.
    pub links: Vec<String>,
}

/// One `<option>` of a selection control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    /// Visible label.
    pub text: String,
    /// `value` attribute, empty when absent.
    pub value: String,
}

/// A selection control found by probing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectControl {
    /// The probe selector that matched.
    pub selector: String,
    /// Options in document order.
    pub options: Vec<SelectOption>,
}

/// Extract title, heading, description, and outgoing links.
///
/// Relative links are resolved against `page_url`. Links that cannot be
/// resolved or are not http(s) (`mailto:`, `javascript:`) are dropped.
pub fn summarize_page(html: &str, page_url: &str) -> PageSummary {
    let document = Html::parse_document(html);

    let description = meta_description(&document).unwrap_or_else(|| {
        first_text(&document, "p")
            .map(|p| truncate_chars(&p, PARAGRAPH_FALLBACK_CHARS))
            .unwrap_or_default()
    });

    PageSummary {
        title: first_text(&document, "title").unwrap_or_default(),
        heading: first_text(&document, "h1").unwrap_or_default(),
        description,
        links: resolve_links(&document, page_url),
    }
}

/// Source of the embedded player frame on a page.
///
/// Frames are scanned in document order. The first one whose `src`
/// mentions `provider_marker` or `video` (case-insensitive) wins; otherwise
/// the first frame with any `src`. Returns an empty string when the page
/// has no frame.
pub fn extract_frame(html: &str, provider_marker: &str) -> String {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("iframe") else {
        return String::new();
    };
    let marker = provider_marker.to_lowercase();

    let sources: Vec<&str> = document
        .select(&selector)
        .filter_map(|el| el.value().attr("src"))
        .map(str::trim)
        .filter(|src| !src.is_empty())
        .collect();

    let preferred = sources.iter().find(|src| {
        let low = src.to_lowercase();
        (!marker.is_empty() && low.contains(&marker)) || low.contains("video")
    });

    preferred
        .or(sources.first())
        .map(|src| (*src).to_owned())
        .unwrap_or_default()
}

/// Non-empty `src` of the first frame matched by `probes`, in probe order.
pub fn probe_frame(html: &str, probes: &[&str]) -> Option<String> {
    let document = Html::parse_document(html);
    probes.iter().find_map(|probe| {
        let selector = Selector::parse(probe).ok()?;
        document
            .select(&selector)
            .filter_map(|el| el.value().attr("src"))
            .map(str::trim)
            .find(|src| !src.is_empty())
            .map(str::to_owned)
    })
}

/// The first selection control matched by `probes`, tried in order.
///
/// A probe that matches a `<select>` without options is skipped.
pub fn find_select(html: &str, probes: &[&str]) -> Option<SelectControl> {
    let document = Html::parse_document(html);
    let option_sel = Selector::parse("option").ok()?;

    for probe in probes {
        let Ok(selector) = Selector::parse(probe) else {
            tracing::debug!(probe, "unparseable select probe");
            continue;
        };
        let Some(select) = document.select(&selector).next() else {
            continue;
        };
        let options: Vec<SelectOption> = select
            .select(&option_sel)
            .map(|opt| SelectOption {
                text: collapse(opt),
                value: opt.value().attr("value").unwrap_or_default().trim().to_owned(),
            })
            .collect();
        if options.is_empty() {
            continue;
        }
        return Some(SelectControl {
            selector: (*probe).to_owned(),
            options,
        });
    }
    None
}

/// The first of `probes` that matches an element on the page.
pub fn first_matching_probe<'a>(html: &str, probes: &[&'a str]) -> Option<&'a str> {
    let document = Html::parse_document(html);
    probes.iter().copied().find(|probe| {
        Selector::parse(probe)
            .map(|s| document.select(&s).next().is_some())
            .unwrap_or(false)
    })
}

/// First anchor matched by `probes` (in probe order), resolved against
/// `page_url`.
pub fn first_probe_link(html: &str, page_url: &str, probes: &[&str]) -> Option<String> {
    let document = Html::parse_document(html);
    let base = Url::parse(page_url).ok()?;

    for probe in probes {
        let Ok(selector) = Selector::parse(probe) else {
            continue;
        };
        let found = document
            .select(&selector)
            .filter_map(|a| a.value().attr("href"))
            .filter_map(|href| base.join(href.trim()).ok())
            .find(|u| matches!(u.scheme(), "http" | "https"));
        if let Some(url) = found {
            return Some(url.to_string());
        }
    }
    None
}

fn meta_description(document: &Html) -> Option<String> {
    let selector = Selector::parse(r#"meta[name="description"]"#).ok()?;
    document
        .select(&selector)
        .filter_map(|m| m.value().attr("content"))
        .map(|c| c.split_whitespace().collect::<Vec<_>>().join(" "))
        .find(|c| !c.is_empty())
}

fn first_text(document: &Html, tag: &str) -> Option<String> {
    let selector = Selector::parse(tag).ok()?;
    document
        .select(&selector)
        .map(collapse)
        .find(|t| !t.is_empty())
}

fn resolve_links(document: &Html, page_url: &str) -> Vec<String> {
    let (Ok(selector), Ok(base)) = (Selector::parse("a[href]"), Url::parse(page_url)) else {
        return Vec::new();
    };

    let mut links: Vec<String> = Vec::new();
    for href in document.select(&selector).filter_map(|a| a.value().attr("href")) {
        let Ok(joined) = base.join(href.trim()) else {
            continue;
        };
        let Ok(canonical) = canonicalize(joined.as_str()) else {
            continue;
        };
        if !links.contains(&canonical) {
            links.push(canonical);
        }
    }
    links
}

fn collapse(el: ElementRef<'_>) -> String {
    el.text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Truncate text to the given character count, on a char boundary.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => text[..end].to_owned(),
        None => text.to_owned(),
    }
}
