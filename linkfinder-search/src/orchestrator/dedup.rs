//! Candidate deduplication by canonical URL and near-identical title.
//!
//! Walks a ranked list in order and keeps the first occurrence of each
//! page. A later candidate is dropped when its canonical URL was already
//! kept, or when its title is near-identical to an already kept title.
//! Input order is preserved, so callers sort before deduplicating.

use std::collections::HashSet;

use crate::types::Candidate;

use super::similarity::token_set_ratio;
use super::url_normalize::canonicalize;

/// Deduplicate candidates, keeping the earliest of each group.
///
/// `title_threshold` is the token-set similarity (0–100) at or above which
/// two titles are treated as the same page. Candidates whose URL cannot be
/// canonicalised are compared by their raw URL.
pub fn deduplicate(candidates: Vec<Candidate>, title_threshold: f64) -> Vec<Candidate> {
    let mut seen_urls: HashSet<String> = HashSet::new();
    let mut kept: Vec<Candidate> = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let key = canonicalize(&candidate.url).unwrap_or_else(|_| candidate.url.clone());
        if seen_urls.contains(&key) {
            continue;
        }
        let near_duplicate = kept
            .iter()
            .any(|k| token_set_ratio(&k.title, &candidate.title) >= title_threshold);
        if near_duplicate {
            continue;
        }
        seen_urls.insert(key);
        kept.push(candidate);
    }

    kept
}
