//! Core types shared by the crawler, external search, and the navigator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A titled, scored URL produced by crawling or by external search.
///
/// `url` is always absolute and scheme-qualified. `score` is derived from
/// the other fields by [`crate::orchestrator::scoring::relevance_score`]
/// and is recomputed rather than edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Page or result title.
    pub title: String,
    /// Absolute URL of the page.
    pub url: String,
    /// Description, snippet, or first paragraph.
    pub snippet: String,
    /// Relevance score; `>= 100` is excellent.
    pub score: f64,
}

impl Candidate {
    /// Build an unscored candidate.
    pub fn new(title: impl Into<String>, url: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
            score: 0.0,
        }
    }
}

/// Where a [`ResolutionResult`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionSource {
    /// A provider URL supplied by the caller, normalised in place.
    ProviderDirect,
    /// Found through provider-scoped external search.
    ProviderSearch,
    /// Provider-scoped search was explicitly requested and found nothing.
    ProviderSearchFailed,
    /// Found by crawling or navigating the requested site.
    SiteSearch,
    /// Nothing usable was found.
    None,
}

impl ResolutionSource {
    /// Stable kebab-case name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ProviderDirect => "provider-direct",
            Self::ProviderSearch => "provider-search",
            Self::ProviderSearchFailed => "provider-search-failed",
            Self::SiteSearch => "site-search",
            Self::None => "none",
        }
    }
}

impl fmt::Display for ResolutionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Terminal output of [`crate::orchestrator::resolve::Resolver::resolve`].
///
/// Construct through the associated functions so that a `none` source
/// never carries a link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionResult {
    /// Which branch produced the link.
    pub source: ResolutionSource,
    /// The best reachable link; empty when nothing was found.
    pub link: String,
    /// The page the link was found on (or the site that was searched).
    pub page: String,
    /// Human-readable title.
    pub title: String,
    /// Relevance score when the link came from ranking.
    pub score: Option<f64>,
    /// Why this outcome was reached, for end-user explanations.
    pub reason: Option<String>,
}

impl ResolutionResult {
    /// A successful resolution.
    pub fn found(
        source: ResolutionSource,
        link: impl Into<String>,
        page: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            source,
            link: link.into(),
            page: page.into(),
            title: title.into(),
            score: None,
            reason: None,
        }
    }

    /// Nothing was found; `reason` explains why.
    pub fn none(reason: impl Into<String>) -> Self {
        Self {
            source: ResolutionSource::None,
            link: String::new(),
            page: String::new(),
            title: String::new(),
            score: None,
            reason: Some(reason.into()),
        }
    }

    /// Attach a relevance score.
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    /// Attach an explanation.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Whether a usable link was produced.
    pub fn is_found(&self) -> bool {
        !self.link.is_empty()
    }
}

/// Result of the episode-selection step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeSelection {
    /// Episode number the caller asked for.
    pub requested: Option<u32>,
    /// Visible label of the chosen option, or a placeholder.
    pub matched_label: String,
    /// Whether an option was actually selected. Always false without a request.
    pub found: bool,
}

impl EpisodeSelection {
    /// No episode was chosen; the page default stays active.
    pub fn unselected(requested: Option<u32>, label: impl Into<String>) -> Self {
        Self {
            requested,
            matched_label: label.into(),
            found: false,
        }
    }
}

/// A player option after it has been activated and its frame read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerCandidate {
    /// Visible label of the player option.
    pub label: String,
    /// Source of the active embedded frame (may be empty).
    pub iframe_url: String,
    /// Whether the frame belongs to the target provider.
    pub is_target_provider: bool,
}

/// States of the episode/player navigator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavState {
    /// A content page has been reached.
    EntrySelected,
    /// Episode selection has been attempted.
    EpisodeResolved,
    /// A player (or the bare page) has been chosen.
    PlayerResolved,
    /// A final link was produced.
    LinkExtracted,
    /// No usable player link could be produced.
    NoReliablePlayer,
}

impl fmt::Display for NavState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::EntrySelected => "entry_selected",
            Self::EpisodeResolved => "episode_resolved",
            Self::PlayerResolved => "player_resolved",
            Self::LinkExtracted => "link_extracted",
            Self::NoReliablePlayer => "no_reliable_player",
        };
        f.write_str(name)
    }
}

/// Everything the navigator learned, successful or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationOutcome {
    /// Whether `final_url` is a usable link.
    pub matched: bool,
    /// Furthest state reached.
    pub state: NavState,
    /// Content page that was navigated.
    pub page_url: String,
    /// Title of the content page.
    pub title: String,
    /// Episode step result.
    pub episode: EpisodeSelection,
    /// Label of the chosen player option.
    pub player_label: String,
    /// Frame source as found on the page.
    pub raw_frame: String,
    /// Link returned to the caller.
    pub final_url: String,
    /// Explanation of the outcome.
    pub why: String,
}

impl NavigationOutcome {
    /// An outcome that stopped before a link could be extracted.
    pub fn failed(state: NavState, page_url: impl Into<String>, why: impl Into<String>) -> Self {
        Self {
            matched: false,
            state,
            page_url: page_url.into(),
            title: String::new(),
            episode: EpisodeSelection::default(),
            player_label: String::new(),
            raw_frame: String::new(),
            final_url: String::new(),
            why: why.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_starts_unscored() {
        let c = Candidate::new("Title", "https://a.com/x", "snippet");
        assert_eq!(c.title, "Title");
        assert!(c.score.abs() < f64::EPSILON);
    }

    #[test]
    fn none_result_has_empty_link() {
        let r = ResolutionResult::none("site unreachable");
        assert_eq!(r.source, ResolutionSource::None);
        assert!(r.link.is_empty());
        assert!(!r.is_found());
        assert_eq!(r.reason.as_deref(), Some("site unreachable"));
    }

    #[test]
    fn found_result_builder() {
        let r = ResolutionResult::found(
            ResolutionSource::SiteSearch,
            "https://a.com/ep",
            "https://a.com/ep",
            "Episode",
        )
        .with_score(101.5);
        assert!(r.is_found());
        assert_eq!(r.score, Some(101.5));
    }

    #[test]
    fn source_names_are_kebab_case() {
        assert_eq!(ResolutionSource::ProviderDirect.to_string(), "provider-direct");
        assert_eq!(
            ResolutionSource::ProviderSearchFailed.to_string(),
            "provider-search-failed"
        );
        assert_eq!(ResolutionSource::None.to_string(), "none");
    }

    #[test]
    fn source_serializes_like_display() {
        let json = serde_json::to_string(&ResolutionSource::SiteSearch).expect("serialize");
        assert_eq!(json, "\"site-search\"");
    }

    #[test]
    fn unselected_episode_is_not_found() {
        let e = EpisodeSelection::unselected(Some(12), "(episode 12 not found)");
        assert!(!e.found);
        assert_eq!(e.requested, Some(12));
        assert!(!EpisodeSelection::default().found);
    }

    #[test]
    fn failed_outcome_is_unmatched() {
        let o = NavigationOutcome::failed(NavState::EntrySelected, "https://a.com", "no result");
        assert!(!o.matched);
        assert!(o.final_url.is_empty());
        assert_eq!(o.state.to_string(), "entry_selected");
    }
}
