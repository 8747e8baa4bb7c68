//! Resolution strategy: turn (site or alias, keyword, episode) into one
//! best link.
//!
//! Branches are tried in a fixed order and the first applicable one wins:
//!
//! 1. the provider alias: provider-scoped external search only
//! 2. a provider URL in either argument: normalised in place
//! 3. a named site: the navigator for the multi-step site, the crawler
//!    for every other site
//! 4. no site (or the generic placeholder): provider-scoped search
//! 5. otherwise nothing
//!
//! Every outcome is a [`ResolutionResult`]; failures become `none` results
//! carrying a reason.

use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::browser::Renderer;
use crate::config::SearchConfig;
use crate::crawler;
use crate::engine::SearchEngineTrait;
use crate::error::Result;
use crate::external::{first_site_result, provider_search};
use crate::http::build_client;
use crate::navigator::{Entry, Navigator};
use crate::orchestrator::url_normalize::same_domain;
use crate::provider::ProviderLinkNormalizer;
use crate::types::{Candidate, NavState, NavigationOutcome, ResolutionResult, ResolutionSource};

/// Site argument meaning "no particular site".
pub const GENERIC_SITE: &str = "general";

fn episode_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{1,4})\b").expect("valid regex"))
}

/// First standalone 1–4 digit number in `text`.
///
/// This is a heuristic: "Season 4 Episode 100" yields 4. Callers that know
/// the episode should pass it explicitly.
///
/// # Examples
///
/// ```
/// use linkfinder_search::orchestrator::resolve::episode_from_text;
///
/// assert_eq!(episode_from_text("ONE PIECE 100 VF"), Some(100));
/// assert_eq!(episode_from_text("Attack on Titan"), None);
/// ```
pub fn episode_from_text(text: &str) -> Option<u32> {
    episode_pattern()
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
}

fn looks_like_url(text: &str) -> bool {
    let lower = text.trim_start().to_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Resolution entry point. Cheap to clone; clones share the renderer,
/// engine, and configuration.
pub struct Resolver<R, E> {
    renderer: Arc<R>,
    engine: Arc<E>,
    config: Arc<SearchConfig>,
    normalizer: ProviderLinkNormalizer,
    verify_client: Option<reqwest::Client>,
}

impl<R, E> Clone for Resolver<R, E> {
    fn clone(&self) -> Self {
        Self {
            renderer: Arc::clone(&self.renderer),
            engine: Arc::clone(&self.engine),
            config: Arc::clone(&self.config),
            normalizer: self.normalizer.clone(),
            verify_client: self.verify_client.clone(),
        }
    }
}

impl<R: Renderer, E: SearchEngineTrait> Resolver<R, E> {
    /// Validate `config` and build a resolver.
    ///
    /// # Errors
    ///
    /// [`crate::SearchError::Config`] for an invalid configuration, or
    /// [`crate::SearchError::Http`] if link verification is enabled and its
    /// client cannot be built.
    pub fn new(renderer: R, engine: E, config: SearchConfig) -> Result<Self> {
        config.validate()?;
        let verify_client = if config.provider.verify_links {
            Some(build_client(&config.external)?)
        } else {
            None
        };
        Ok(Self {
            renderer: Arc::new(renderer),
            engine: Arc::new(engine),
            normalizer: ProviderLinkNormalizer::new(config.provider.clone()),
            config: Arc::new(config),
            verify_client,
        })
    }

    /// Configuration in use.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// The external search engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Provider link normaliser built from the configuration.
    pub fn normalizer(&self) -> &ProviderLinkNormalizer {
        &self.normalizer
    }

    /// Resolve `keyword` on `site_or_alias` to one link.
    pub async fn resolve(
        &self,
        site_or_alias: &str,
        keyword: &str,
        episode: Option<u32>,
    ) -> ResolutionResult {
        let site = site_or_alias.trim();
        let keyword = keyword.trim();
        tracing::trace!(site, keyword, ?episode, "resolve");

        let alias = &self.config.provider.alias;
        if site.eq_ignore_ascii_case(alias) {
            return match self.search_provider(keyword).await {
                Some(found) => found,
                None => ResolutionResult {
                    source: ResolutionSource::ProviderSearchFailed,
                    title: format!("{alias} search unavailable (anti-bot challenge)"),
                    ..ResolutionResult::none(format!(
                        "no {alias} share link found for \"{keyword}\" through external search"
                    ))
                },
            };
        }

        for text in [site, keyword] {
            if !looks_like_url(text) {
                continue;
            }
            if let Some(link) = self.normalizer.normalize(text) {
                tracing::info!(link, "provider link normalized");
                return ResolutionResult::found(
                    ResolutionSource::ProviderDirect,
                    link,
                    site,
                    format!("normalized {alias} link"),
                );
            }
        }

        if !site.is_empty() && !site.eq_ignore_ascii_case(GENERIC_SITE) {
            return self.resolve_on_site(site, keyword, episode).await;
        }

        if let Some(found) = self.search_provider(keyword).await {
            return found;
        }

        tracing::info!(keyword, "nothing resolved");
        ResolutionResult::none(format!("nothing found for \"{keyword}\""))
    }

    /// Crawl `url` for `query` and return the `top_k` best pages.
    ///
    /// # Errors
    ///
    /// See [`crawler::crawl_site`].
    pub async fn crawl_site(&self, url: &str, query: &str, top_k: usize) -> Result<Vec<Candidate>> {
        crawler::crawl_site(self.renderer.as_ref(), url, query, top_k, &self.config).await
    }

    /// Turbo path for the multi-step site.
    ///
    /// The episode is taken from the first number in `query`. Unless
    /// `direct_url` is given, the content page is the first `site:` scoped
    /// external result; in-site search is skipped either way.
    pub async fn fast_resolve(&self, query: &str, direct_url: Option<&str>) -> NavigationOutcome {
        let episode = episode_from_text(query);
        let site = &self.config.multi_step_site;

        let page = match direct_url.map(str::trim).filter(|u| !u.is_empty()) {
            Some(url) => url.to_owned(),
            None => match first_site_result(self.engine.as_ref(), site, query).await {
                Some(url) => url,
                None => {
                    let mut outcome = NavigationOutcome::failed(
                        NavState::EntrySelected,
                        "",
                        format!("no result for \"{query}\" on {site}"),
                    );
                    outcome.episode.requested = episode;
                    return outcome;
                }
            },
        };

        self.navigator()
            .run(self.renderer.as_ref(), Entry::Page(&page), episode)
            .await
    }

    fn navigator(&self) -> Navigator<'_, E> {
        Navigator::new(self.engine.as_ref(), &self.config, &self.normalizer)
    }

    async fn resolve_on_site(&self, site: &str, keyword: &str, episode: Option<u32>) -> ResolutionResult {
        let url = if looks_like_url(site) {
            site.to_owned()
        } else {
            format!("https://{site}")
        };

        if same_domain(&url, &self.config.multi_step_site) {
            let outcome = self
                .navigator()
                .run(self.renderer.as_ref(), Entry::Search { site, keyword }, episode)
                .await;
            return if outcome.matched {
                ResolutionResult::found(
                    ResolutionSource::SiteSearch,
                    outcome.final_url,
                    outcome.page_url,
                    outcome.title,
                )
                .with_reason(outcome.why)
            } else {
                ResolutionResult {
                    page: outcome.page_url,
                    ..ResolutionResult::none(outcome.why)
                }
            };
        }

        match self.crawl_site(&url, keyword, 1).await {
            Ok(candidates) => match candidates.into_iter().next() {
                Some(best) => {
                    tracing::info!(url = %best.url, score = best.score, "site search resolved");
                    ResolutionResult::found(
                        ResolutionSource::SiteSearch,
                        best.url.clone(),
                        best.url,
                        best.title,
                    )
                    .with_score(best.score)
                }
                None => ResolutionResult::none(format!("no page on {site} matched \"{keyword}\"")),
            },
            Err(e) => {
                tracing::warn!(site, error = %e, "site search failed");
                ResolutionResult::none(format!("search on {site} failed: {e}"))
            }
        }
    }

    async fn search_provider(&self, keyword: &str) -> Option<ResolutionResult> {
        let hit = provider_search(self.engine.as_ref(), keyword, &self.normalizer).await?;

        if let Some(ref client) = self.verify_client {
            match self.normalizer.verify(client, &hit.link).await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::info!(link = %hit.link, "share link failed verification");
                    return None;
                }
                Err(e) => {
                    tracing::warn!(link = %hit.link, error = %e, "share link verification error");
                    return None;
                }
            }
        }

        let provider = &self.config.provider;
        let title = if hit.title.is_empty() {
            format!("found on {}: {keyword}", provider.alias)
        } else {
            hit.title
        };
        Some(
            ResolutionResult::found(
                ResolutionSource::ProviderSearch,
                hit.link,
                format!("https://{}/", provider.host),
                title,
            )
            .with_score(hit.score),
        )
    }
}
