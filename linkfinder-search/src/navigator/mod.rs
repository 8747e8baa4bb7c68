//! Episode/player navigator.
//!
//! Walks a content page's selection UI to reach a playable link:
//!
//! ```text
//! EntrySelected -> EpisodeResolved -> PlayerResolved -> LinkExtracted
//!                                                    \-> NoReliablePlayer
//! ```
//!
//! Site quirks live in [`profiles`]; this module only sequences the steps.
//! Errors never escape: they end the walk and are reported in
//! [`NavigationOutcome::why`] together with the progress made so far.

pub mod profiles;

use crate::browser::{PageSession, Renderer};
use crate::config::SearchConfig;
use crate::content::{
    extract_frame, find_select, first_matching_probe, first_probe_link, probe_frame, summarize_page,
};
use crate::engine::SearchEngineTrait;
use crate::error::{Result, SearchError};
use crate::external::first_site_result;
use crate::orchestrator::url_normalize::registrable_host;
use crate::provider::ProviderLinkNormalizer;
use crate::types::{EpisodeSelection, NavState, NavigationOutcome, PlayerCandidate};

pub use profiles::{profile_for, AnimeSamaSite, GenericSite, SiteProfile};

const WHY_PROVIDER_FOUND: &str = "provider player found, share link normalized";
const WHY_FIRST_PLAYER: &str = "provider absent, first available player";
const WHY_NO_FRAME: &str = "no player frame on the page";

/// Where the walk starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry<'a> {
    /// The content page is already known.
    Page(&'a str),
    /// Find the content page by searching `site` for `keyword`.
    Search {
        /// Site root or bare domain.
        site: &'a str,
        /// Free-text query.
        keyword: &'a str,
    },
}

impl Entry<'_> {
    fn suffix(&self) -> &'static str {
        match self {
            Self::Page(_) => " (direct page)",
            Self::Search { .. } => " (via search)",
        }
    }

    fn start_url(&self) -> String {
        match self {
            Self::Page(url) => (*url).to_owned(),
            Self::Search { site, .. } => with_scheme(site),
        }
    }
}

fn with_scheme(site: &str) -> String {
    let site = site.trim().trim_end_matches('/');
    if site.starts_with("http://") || site.starts_with("https://") {
        site.to_owned()
    } else {
        format!("https://{site}")
    }
}

/// Drives one session through the episode/player selection UI.
pub struct Navigator<'a, E> {
    engine: &'a E,
    config: &'a SearchConfig,
    normalizer: &'a ProviderLinkNormalizer,
}

impl<'a, E: SearchEngineTrait> Navigator<'a, E> {
    /// `engine` is used only when in-site search finds nothing.
    pub fn new(engine: &'a E, config: &'a SearchConfig, normalizer: &'a ProviderLinkNormalizer) -> Self {
        Self {
            engine,
            config,
            normalizer,
        }
    }

    /// Open a fresh session, walk it, and close it.
    pub async fn run<R: Renderer>(
        &self,
        renderer: &R,
        entry: Entry<'_>,
        episode: Option<u32>,
    ) -> NavigationOutcome {
        let mut session = match renderer.open_session().await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "navigator could not open a session");
                return NavigationOutcome::failed(NavState::EntrySelected, entry.start_url(), e.to_string());
            }
        };
        let outcome = self.walk(&mut session, entry, episode).await;
        session.close().await;
        outcome
    }

    /// Walk an already-open session. The caller closes it.
    pub async fn walk<S: PageSession>(
        &self,
        session: &mut S,
        entry: Entry<'_>,
        episode: Option<u32>,
    ) -> NavigationOutcome {
        let mut outcome = NavigationOutcome::failed(NavState::EntrySelected, entry.start_url(), "");
        outcome.episode = EpisodeSelection::unselected(episode, "(no episode selected)");

        if let Err(e) = self.advance(session, entry, episode, &mut outcome).await {
            tracing::warn!(state = %outcome.state, page = %outcome.page_url, error = %e, "navigation stopped");
            outcome.matched = false;
            outcome.final_url.clear();
            outcome.why = e.to_string();
        }
        tracing::info!(
            matched = outcome.matched,
            state = %outcome.state,
            page = %outcome.page_url,
            "navigation finished"
        );
        outcome
    }

    async fn advance<S: PageSession>(
        &self,
        session: &mut S,
        entry: Entry<'_>,
        episode: Option<u32>,
        out: &mut NavigationOutcome,
    ) -> Result<()> {
        let page_url = match entry {
            Entry::Page(url) => url.to_owned(),
            Entry::Search { site, keyword } => match self.find_content_page(session, site, keyword).await? {
                Some(url) => url,
                None => {
                    out.why = format!("no result for \"{keyword}\" on {site}");
                    return Ok(());
                }
            },
        };
        out.page_url = page_url.clone();

        let host = registrable_host(&page_url)
            .ok_or_else(|| SearchError::MalformedUrl(format!("{page_url}: missing host")))?;
        let profile = profile_for(&host, &self.config.multi_step_site);
        tracing::debug!(page = %page_url, profile = profile.name(), "content page selected");

        session.navigate(&page_url, self.config.crawl.page_timeout()).await?;
        out.state = NavState::EntrySelected;
        let html = session.html().await?;
        out.title = summarize_page(&html, &page_url).title;

        out.episode = self.pick_episode(session, profile, &html, episode).await;
        out.state = NavState::EpisodeResolved;

        let player = self.pick_player(session, profile).await?;
        out.player_label = player.label;
        out.raw_frame = player.iframe_url.clone();
        out.state = NavState::PlayerResolved;

        let why = if player.is_target_provider {
            out.final_url = self
                .normalizer
                .normalize(&player.iframe_url)
                .unwrap_or(player.iframe_url);
            out.matched = true;
            WHY_PROVIDER_FOUND
        } else {
            out.matched = !player.iframe_url.is_empty();
            out.final_url = player.iframe_url;
            if out.matched {
                WHY_FIRST_PLAYER
            } else {
                WHY_NO_FRAME
            }
        };
        out.state = if out.matched {
            NavState::LinkExtracted
        } else {
            NavState::NoReliablePlayer
        };
        out.why = format!("{why}{}", entry.suffix());
        Ok(())
    }

    /// Site root → in-site search → first result link, falling back to a
    /// `site:` scoped external search. Only the root navigation is fatal.
    async fn find_content_page<S: PageSession>(
        &self,
        session: &mut S,
        site: &str,
        keyword: &str,
    ) -> Result<Option<String>> {
        let start = with_scheme(site);
        let host = registrable_host(&start)
            .ok_or_else(|| SearchError::MalformedUrl(format!("{site}: missing host")))?;
        let profile = profile_for(&host, &self.config.multi_step_site);
        let timeout = self.config.crawl.page_timeout();

        session.navigate(&start, timeout).await?;
        let html = session.html().await?;
        match first_matching_probe(&html, profile.search_inputs()) {
            Some(input) => {
                if let Err(e) = session.submit_search(input, keyword, timeout).await {
                    tracing::warn!(site = %start, error = %e, "in-site search failed");
                }
            }
            None => tracing::debug!(site = %start, "no search input"),
        }

        let html = session.html().await?;
        let here = session.current_url().await.unwrap_or_else(|_| start.clone());
        if let Some(link) = first_probe_link(&html, &here, profile.result_links()) {
            tracing::debug!(link, "in-site search result");
            return Ok(Some(link));
        }

        Ok(first_site_result(self.engine, &host, keyword).await)
    }

    async fn pick_episode<S: PageSession>(
        &self,
        session: &mut S,
        profile: &dyn SiteProfile,
        html: &str,
        episode: Option<u32>,
    ) -> EpisodeSelection {
        let Some(number) = episode else {
            return EpisodeSelection::unselected(None, "(no episode selected)");
        };
        let Some(control) = find_select(html, profile.episode_controls()) else {
            tracing::debug!(episode = number, "no episode selector");
            return EpisodeSelection::unselected(episode, "(no episode selector)");
        };

        let needle = number.to_string();
        let Some((index, option)) = control
            .options
            .iter()
            .enumerate()
            .find(|(_, o)| o.text.contains(&needle) || o.value.contains(&needle))
        else {
            tracing::debug!(episode = number, options = control.options.len(), "episode not listed");
            return EpisodeSelection::unselected(episode, format!("(episode {number} not found)"));
        };

        let settle = std::time::Duration::from_millis(self.config.browser.episode_settle_ms);
        match session.select_option(&control.selector, index, settle).await {
            Ok(()) => EpisodeSelection {
                requested: episode,
                matched_label: option.text.clone(),
                found: true,
            },
            Err(e) => {
                tracing::warn!(episode = number, error = %e, "episode selection failed");
                EpisodeSelection::unselected(episode, format!("(episode {number} selection failed)"))
            }
        }
    }

    /// Try each player option until one shows the provider's frame; else
    /// the first option's frame; else the bare page's frame.
    async fn pick_player<S: PageSession>(
        &self,
        session: &mut S,
        profile: &dyn SiteProfile,
    ) -> Result<PlayerCandidate> {
        let html = session.html().await?;
        let Some(control) = find_select(&html, profile.player_controls()) else {
            return Ok(self.player_candidate("(no player selector)", &html, profile));
        };
        let settle = std::time::Duration::from_millis(self.config.browser.player_settle_ms);

        for (index, option) in control.options.iter().enumerate() {
            if let Err(e) = session.select_option(&control.selector, index, settle).await {
                tracing::warn!(player = %option.text, error = %e, "player selection failed");
                continue;
            }
            let html = session.html().await?;
            let candidate = self.player_candidate(&option.text, &html, profile);
            tracing::debug!(player = %candidate.label, frame = %candidate.iframe_url, "player tried");
            if candidate.is_target_provider {
                return Ok(candidate);
            }
        }

        let first = control
            .options
            .first()
            .map(|o| o.text.clone())
            .unwrap_or_default();
        if let Err(e) = session.select_option(&control.selector, 0, settle).await {
            tracing::warn!(error = %e, "could not return to the first player");
        }
        let html = session.html().await?;
        Ok(self.player_candidate(&first, &html, profile))
    }

    fn player_candidate(&self, label: &str, html: &str, profile: &dyn SiteProfile) -> PlayerCandidate {
        let iframe_url = probe_frame(html, profile.active_frame())
            .unwrap_or_else(|| extract_frame(html, &self.normalizer.config().marker));
        PlayerCandidate {
            label: label.to_owned(),
            is_target_provider: self.normalizer.references_provider(&iframe_url),
            iframe_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::FakeRenderer;
    use crate::config::ProviderConfig;
    use crate::engine::mock::MockEngine;
    use crate::types::Candidate;

    const SIBNET_FRAME: &str = r#"<iframe src="https://video.sibnet.ru/shell.php?videoid=4242"></iframe>"#;
    const OTHER_FRAME: &str = r#"<iframe src="https://vidmoly.to/embed-abc.html"></iframe>"#;

    const EPISODES: &str = r#"<select id="selectEpisodes">
        <option value="1">Episode 1</option>
        <option value="12">Episode 12</option>
    </select>"#;
    const PLAYERS: &str = r#"<select id="selectLecteurs">
        <option>Lecteur 1</option>
        <option>Lecteur 2</option>
    </select>"#;
    const GENERIC_PLAYERS: &str = r#"<select name="player">
        <option>Lecteur 1</option>
        <option>Lecteur 2</option>
    </select>"#;

    fn doc(title: &str, body: &str) -> String {
        format!("<html><head><title>{title}</title></head><body>{body}</body></html>")
    }

    fn config() -> SearchConfig {
        let mut config = SearchConfig::default();
        config.browser.episode_settle_ms = 0;
        config.browser.player_settle_ms = 0;
        config
    }

    fn normalizer() -> ProviderLinkNormalizer {
        ProviderLinkNormalizer::new(ProviderConfig::default())
    }

    #[tokio::test]
    async fn missing_episode_control_still_extracts_link() {
        let renderer = FakeRenderer::new().page("https://a.com/show", &doc("Show", SIBNET_FRAME));
        let (engine, config, normalizer) = (MockEngine::new(), config(), normalizer());

        let outcome = Navigator::new(&engine, &config, &normalizer)
            .run(&renderer, Entry::Page("https://a.com/show"), Some(12))
            .await;

        assert!(outcome.matched);
        assert_eq!(outcome.state, NavState::LinkExtracted);
        assert!(!outcome.episode.found);
        assert_eq!(outcome.episode.requested, Some(12));
        assert_eq!(outcome.final_url, "https://video.sibnet.ru/video4242");
        assert_eq!(outcome.title, "Show");
        assert_eq!(outcome.why, format!("{WHY_PROVIDER_FOUND} (direct page)"));
        assert_eq!(renderer.closed(), 1);
    }

    #[tokio::test]
    async fn selects_episode_then_prefers_provider_player() {
        let page = "https://anime-sama.fr/catalogue/naruto/saison1/vostfr";
        let base = doc("Naruto", &format!("{EPISODES}{PLAYERS}"));
        let episode_12 = doc("Naruto", &format!("{EPISODES}{PLAYERS}{OTHER_FRAME}"));
        let renderer = FakeRenderer::new()
            .page(page, &base)
            .variants(page, "#selectEpisodes", vec![base.clone(), episode_12.clone()])
            .variants(
                page,
                "#selectLecteurs",
                vec![
                    doc("Naruto", &format!("{PLAYERS}{OTHER_FRAME}")),
                    doc("Naruto", &format!("{PLAYERS}{SIBNET_FRAME}")),
                ],
            );
        let (engine, config, normalizer) = (MockEngine::new(), config(), normalizer());

        let outcome = Navigator::new(&engine, &config, &normalizer)
            .run(&renderer, Entry::Page(page), Some(12))
            .await;

        assert!(outcome.episode.found);
        assert_eq!(outcome.episode.matched_label, "Episode 12");
        assert_eq!(outcome.player_label, "Lecteur 2");
        assert_eq!(outcome.raw_frame, "https://video.sibnet.ru/shell.php?videoid=4242");
        assert_eq!(outcome.final_url, "https://video.sibnet.ru/video4242");
        assert_eq!(outcome.state, NavState::LinkExtracted);
    }

    #[tokio::test]
    async fn falls_back_to_first_player_without_provider() {
        let page = "https://a.com/show";
        let renderer = FakeRenderer::new()
            .page(page, &doc("Show", GENERIC_PLAYERS))
            .variants(
                page,
                "select[name*='player']",
                vec![
                    doc("Show", &format!("{GENERIC_PLAYERS}{OTHER_FRAME}")),
                    doc("Show", &format!("{GENERIC_PLAYERS}<iframe src=\"https://x.com/e/2\"></iframe>")),
                ],
            );
        let (engine, config, normalizer) = (MockEngine::new(), config(), normalizer());

        let outcome = Navigator::new(&engine, &config, &normalizer)
            .run(&renderer, Entry::Page(page), None)
            .await;

        assert!(outcome.matched);
        assert_eq!(outcome.player_label, "Lecteur 1");
        assert_eq!(outcome.final_url, "https://vidmoly.to/embed-abc.html");
        assert_eq!(outcome.why, format!("{WHY_FIRST_PLAYER} (direct page)"));
        assert_eq!(outcome.episode.matched_label, "(no episode selected)");
    }

    #[tokio::test]
    async fn page_without_frame_has_no_reliable_player() {
        let renderer = FakeRenderer::new().page("https://a.com/show", &doc("Show", "<p>soon</p>"));
        let (engine, config, normalizer) = (MockEngine::new(), config(), normalizer());

        let outcome = Navigator::new(&engine, &config, &normalizer)
            .run(&renderer, Entry::Page("https://a.com/show"), None)
            .await;

        assert!(!outcome.matched);
        assert_eq!(outcome.state, NavState::NoReliablePlayer);
        assert!(outcome.final_url.is_empty());
    }

    #[tokio::test]
    async fn search_entry_uses_in_site_results() {
        let home = doc("Home", r#"<form><input type="search" name="q"></form>"#);
        let results = doc(
            "Results",
            r#"<div class="result"><a href="/catalogue/naruto/">Naruto</a></div>"#,
        );
        let renderer = FakeRenderer::new()
            .page("https://a.com", &home)
            .search_to("https://a.com", "https://a.com/search?q={q}")
            .page("https://a.com/search?q=naruto", &results)
            .page("https://a.com/catalogue/naruto/", &doc("Naruto", OTHER_FRAME));
        let (engine, config, normalizer) = (MockEngine::new(), config(), normalizer());

        let outcome = Navigator::new(&engine, &config, &normalizer)
            .run(&renderer, Entry::Search { site: "a.com", keyword: "naruto" }, None)
            .await;

        assert_eq!(outcome.page_url, "https://a.com/catalogue/naruto/");
        assert!(outcome.matched);
        assert!(outcome.why.ends_with("(via search)"));
        assert!(engine.seen().is_empty());
    }

    #[tokio::test]
    async fn search_entry_falls_back_to_external_search() {
        let renderer = FakeRenderer::new()
            .page("https://a.com", &doc("Home", "<p>no search box</p>"))
            .page("https://a.com/naruto", &doc("Naruto", SIBNET_FRAME));
        let engine = MockEngine::new().answer(
            "site:a.com naruto",
            vec![Candidate::new("Naruto", "https://a.com/naruto", "")],
        );
        let (config, normalizer) = (config(), normalizer());

        let outcome = Navigator::new(&engine, &config, &normalizer)
            .run(&renderer, Entry::Search { site: "https://a.com/", keyword: "naruto" }, None)
            .await;

        assert_eq!(outcome.page_url, "https://a.com/naruto");
        assert_eq!(outcome.final_url, "https://video.sibnet.ru/video4242");
    }

    #[tokio::test]
    async fn search_without_any_result_is_unmatched() {
        let renderer = FakeRenderer::new().page("https://a.com", &doc("Home", ""));
        let (engine, config, normalizer) = (MockEngine::new(), config(), normalizer());

        let outcome = Navigator::new(&engine, &config, &normalizer)
            .run(&renderer, Entry::Search { site: "a.com", keyword: "naruto" }, None)
            .await;

        assert!(!outcome.matched);
        assert_eq!(outcome.state, NavState::EntrySelected);
        assert!(outcome.why.contains("no result"));
        assert_eq!(engine.seen(), ["site:a.com naruto"]);
    }

    #[tokio::test]
    async fn unreachable_page_is_reported_not_raised() {
        let renderer = FakeRenderer::new().timeout("https://a.com/show");
        let (engine, config, normalizer) = (MockEngine::new(), config(), normalizer());

        let outcome = Navigator::new(&engine, &config, &normalizer)
            .run(&renderer, Entry::Page("https://a.com/show"), Some(3))
            .await;

        assert!(!outcome.matched);
        assert!(outcome.why.contains("timed out"));
        assert_eq!(outcome.page_url, "https://a.com/show");
        assert_eq!(renderer.opened(), 1);
        assert_eq!(renderer.closed(), 1);
    }
}
