//! Domain-scoped lookups on a public search engine.
//!
//! Used as the fallback when a site's own search finds nothing, and as the
//! only route to the video provider. Engine failures and empty pages are
//! logged and reported as "no result", never as errors.

use crate::config::ScoreThresholds;
use crate::engine::SearchEngineTrait;
use crate::orchestrator::dedup::deduplicate;
use crate::orchestrator::scoring::{is_strong_candidate, relevance_score, score_candidates, sort_by_score};
use crate::provider::ProviderLinkNormalizer;
use crate::types::Candidate;

/// Best provider share link found by [`provider_search`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderHit {
    /// Normalised share link.
    pub link: String,
    /// Result title as shown by the engine.
    pub title: String,
    /// Relevance of the hit to the query.
    pub score: f64,
    /// Query variant that produced the hit.
    pub query: String,
}

async fn run<E: SearchEngineTrait>(engine: &E, query: &str) -> Vec<Candidate> {
    match engine.search(query).await {
        Ok(hits) => {
            tracing::debug!(engine = engine.name(), query, count = hits.len(), "external search");
            hits
        }
        Err(e) => {
            tracing::warn!(engine = engine.name(), query, error = %e, "external search failed");
            Vec::new()
        }
    }
}

fn bare_domain(domain: &str) -> String {
    let lower = domain.trim().to_lowercase();
    let without_scheme = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .unwrap_or(&lower);
    let host = without_scheme.split('/').next().unwrap_or_default();
    host.strip_prefix("www.").unwrap_or(host).to_owned()
}

/// First destination on `domain` for `site:<domain> <query>`.
///
/// Hits are inspected in page order; the first whose host contains the
/// domain wins.
pub async fn first_site_result<E: SearchEngineTrait>(
    engine: &E,
    domain: &str,
    query: &str,
) -> Option<String> {
    let domain = bare_domain(domain);
    if domain.is_empty() {
        return None;
    }
    let hits = run(engine, &format!("site:{domain} {query}")).await;
    let found = hits.into_iter().map(|h| h.url).find(|url| {
        url::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_lowercase))
            .is_some_and(|host| host.contains(&domain))
    });
    if found.is_none() {
        tracing::info!(domain, query, "no site-scoped external result");
    }
    found
}

/// Strong, scored, deduplicated results for an exact-phrase query.
///
/// The query is quoted and optionally scoped with `site:`. Results that
/// are not strong candidates are dropped; the rest are scored, sorted
/// descending, deduplicated, and truncated to `limit`.
pub async fn ranked_search<E: SearchEngineTrait>(
    engine: &E,
    query: &str,
    site: Option<&str>,
    limit: usize,
    thresholds: &ScoreThresholds,
) -> Vec<Candidate> {
    let phrase = format!("\"{query}\"");
    let scoped = match site.map(bare_domain).filter(|d| !d.is_empty()) {
        Some(domain) => format!("site:{domain} {phrase}"),
        None => phrase,
    };

    let mut strong: Vec<Candidate> = run(engine, &scoped)
        .await
        .into_iter()
        .filter(|c| is_strong_candidate(query, &c.title, &c.snippet, thresholds))
        .collect();
    score_candidates(query, &mut strong);
    sort_by_score(&mut strong);

    let mut ranked = deduplicate(strong, thresholds.duplicate_title);
    ranked.truncate(limit);
    ranked
}

/// Provider share link for `query`, found through external search only.
///
/// Tries three query variants in order (quoted, unquoted, reordered). A
/// hit qualifies when it references the provider and normalises to a
/// `/video<id>` share link. Within the first variant that yields any
/// qualifying hit, the highest-scoring one wins.
pub async fn provider_search<E: SearchEngineTrait>(
    engine: &E,
    query: &str,
    normalizer: &ProviderLinkNormalizer,
) -> Option<ProviderHit> {
    let host = &normalizer.config().host;
    let variants = [
        format!("site:{host} \"{query}\""),
        format!("site:{host} {query}"),
        format!("{query} site:{host}"),
    ];

    for variant in variants {
        let mut best: Option<ProviderHit> = None;
        for hit in run(engine, &variant).await {
            if !normalizer.references_provider(&hit.url) || !normalizer.is_share_link(&hit.url) {
                continue;
            }
            let Some(link) = normalizer.normalize(&hit.url) else {
                continue;
            };
            let score = relevance_score(query, &hit.title, &hit.snippet, &hit.url);
            if best.as_ref().is_none_or(|b| score > b.score) {
                best = Some(ProviderHit {
                    link,
                    title: hit.title,
                    score,
                    query: variant.clone(),
                });
            }
        }
        if let Some(hit) = best {
            tracing::info!(query, link = %hit.link, score = hit.score, "provider link found");
            return Some(hit);
        }
    }

    tracing::info!(query, "provider search found nothing");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;
    use crate::engine::mock::MockEngine;

    fn hit(title: &str, url: &str, snippet: &str) -> Candidate {
        Candidate::new(title, url, snippet)
    }

    #[test]
    fn bare_domain_strips_scheme_path_and_www() {
        assert_eq!(bare_domain("https://www.Anime-Sama.fr/catalogue/"), "anime-sama.fr");
        assert_eq!(bare_domain("a.com"), "a.com");
    }

    #[tokio::test]
    async fn first_site_result_skips_foreign_hosts() {
        let engine = MockEngine::new().answer(
            "site:anime-sama.fr one piece",
            vec![
                hit("Ad", "https://elsewhere.com/one-piece", ""),
                hit("One Piece", "https://anime-sama.fr/catalogue/one-piece/", ""),
            ],
        );
        let found = first_site_result(&engine, "https://anime-sama.fr", "one piece").await;
        assert_eq!(found.as_deref(), Some("https://anime-sama.fr/catalogue/one-piece/"));
    }

    #[tokio::test]
    async fn first_site_result_engine_failure_is_none() {
        let engine = MockEngine::failing();
        assert!(first_site_result(&engine, "a.com", "x").await.is_none());
    }

    #[tokio::test]
    async fn ranked_search_filters_weak_and_duplicate_hits() {
        let engine = MockEngine::new().answer(
            "site:a.com \"one piece\"",
            vec![
                hit("Concatenated pieces", "https://a.com/x", ""),
                hit("One Piece", "https://a.com/one-piece", "one piece"),
                hit("One Piece", "https://a.com/one-piece/", "one piece"),
                hit("One Piece Film", "https://a.com/film", ""),
            ],
        );
        let ranked = ranked_search(
            &engine,
            "one piece",
            Some("a.com"),
            3,
            &ScoreThresholds::default(),
        )
        .await;
        // "One Piece Film" is a token superset of the kept title.
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].url, "https://a.com/one-piece");
        assert!(ranked[0].score >= 100.0);
    }

    #[tokio::test]
    async fn ranked_search_without_site_quotes_query() {
        let engine = MockEngine::new();
        let _ = ranked_search(&engine, "bleach", None, 3, &ScoreThresholds::default()).await;
        assert_eq!(engine.seen(), ["\"bleach\""]);
    }

    #[tokio::test]
    async fn provider_search_falls_through_variants() {
        let normalizer = ProviderLinkNormalizer::new(ProviderConfig::default());
        let engine = MockEngine::new()
            .answer(
                "site:video.sibnet.ru \"naruto 12\"",
                vec![hit("Naruto rubric", "https://video.sibnet.ru/rub/anime/", "")],
            )
            .answer(
                "site:video.sibnet.ru naruto 12",
                vec![
                    hit("Naruto 1", "https://video.sibnet.ru/video100-Naruto-1", ""),
                    hit("Naruto 12", "https://video.sibnet.ru/shell.php?videoid=112", ""),
                ],
            );
        let found = provider_search(&engine, "naruto 12", &normalizer)
            .await
            .expect("hit");
        assert_eq!(found.link, "https://video.sibnet.ru/video112");
        assert_eq!(found.query, "site:video.sibnet.ru naruto 12");
        assert_eq!(engine.seen().len(), 2);
    }

    #[tokio::test]
    async fn provider_search_nothing_after_all_variants() {
        let normalizer = ProviderLinkNormalizer::new(ProviderConfig::default());
        let engine = MockEngine::new();
        assert!(provider_search(&engine, "x", &normalizer).await.is_none());
        assert_eq!(engine.seen().len(), 3);
    }
}
