//! Capability profiles: per-site tables of selector probes.
//!
//! A probe list is tried in order and the first match wins. Supporting a
//! new site quirk means adding a selector to a table, not a branch to the
//! navigator.

/// Finds the site's search box and its result links.
pub trait EntryPointProvider: Send + Sync {
    /// Probes for the in-site search input.
    fn search_inputs(&self) -> &'static [&'static str];
    /// Probes for links on a search result page, most specific first.
    fn result_links(&self) -> &'static [&'static str];
}

/// Locates the episode selection control.
pub trait EpisodePicker: Send + Sync {
    /// Probes for the episode `<select>`.
    fn episode_controls(&self) -> &'static [&'static str];
}

/// Locates the player selection control and the active player frame.
pub trait PlayerPicker: Send + Sync {
    /// Probes for the player `<select>`.
    fn player_controls(&self) -> &'static [&'static str];
    /// Probes for the frame of the active player. Empty means "scan all
    /// frames".
    fn active_frame(&self) -> &'static [&'static str] {
        &[]
    }
}

/// Everything the navigator needs to know about one site.
pub trait SiteProfile: EntryPointProvider + EpisodePicker + PlayerPicker {
    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

const GENERIC_SEARCH_INPUTS: &[&str] = &[
    "input[type='search']",
    "input[name*='search']",
    "input[name*='q']",
    "#search",
];

const GENERIC_RESULT_LINKS: &[&str] = &[
    ".search-result a",
    ".result a",
    "article a",
    ".post a",
    ".entry a",
];

const GENERIC_EPISODE_CONTROLS: &[&str] = &[
    "select[name*='episode']",
    "#episode-select",
    ".episode-select",
];

const GENERIC_PLAYER_CONTROLS: &[&str] = &[
    "select[name*='player']",
    "#player-select",
    ".player-select",
];

const ANIME_SAMA_RESULT_LINKS: &[&str] = &[
    "a[href*='catalogue']",
    ".search-result a",
    ".result a",
    "article a",
    ".post a",
    ".entry a",
];

const ANIME_SAMA_EPISODE_CONTROLS: &[&str] = &[
    "#selectEpisodes",
    "select[name*='episode']",
    "#episode-select",
    ".episode-select",
];

const ANIME_SAMA_PLAYER_CONTROLS: &[&str] = &[
    "#selectLecteurs",
    "select[name*='player']",
    "#player-select",
    ".player-select",
];

const ANIME_SAMA_ACTIVE_FRAME: &[&str] = &["#playerDF"];

/// Conventional selectors that work on most sites.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericSite;

impl EntryPointProvider for GenericSite {
    fn search_inputs(&self) -> &'static [&'static str] {
        GENERIC_SEARCH_INPUTS
    }

    fn result_links(&self) -> &'static [&'static str] {
        GENERIC_RESULT_LINKS
    }
}

impl EpisodePicker for GenericSite {
    fn episode_controls(&self) -> &'static [&'static str] {
        GENERIC_EPISODE_CONTROLS
    }
}

impl PlayerPicker for GenericSite {
    fn player_controls(&self) -> &'static [&'static str] {
        GENERIC_PLAYER_CONTROLS
    }
}

impl SiteProfile for GenericSite {
    fn name(&self) -> &'static str {
        "generic"
    }
}

/// The multi-step catalogue site with episode and player pickers.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnimeSamaSite;

impl EntryPointProvider for AnimeSamaSite {
    fn search_inputs(&self) -> &'static [&'static str] {
        GENERIC_SEARCH_INPUTS
    }

    fn result_links(&self) -> &'static [&'static str] {
        ANIME_SAMA_RESULT_LINKS
    }
}

impl EpisodePicker for AnimeSamaSite {
    fn episode_controls(&self) -> &'static [&'static str] {
        ANIME_SAMA_EPISODE_CONTROLS
    }
}

impl PlayerPicker for AnimeSamaSite {
    fn player_controls(&self) -> &'static [&'static str] {
        ANIME_SAMA_PLAYER_CONTROLS
    }

    fn active_frame(&self) -> &'static [&'static str] {
        ANIME_SAMA_ACTIVE_FRAME
    }
}

impl SiteProfile for AnimeSamaSite {
    fn name(&self) -> &'static str {
        "anime-sama"
    }
}

static GENERIC: GenericSite = GenericSite;
static ANIME_SAMA: AnimeSamaSite = AnimeSamaSite;

/// Profile for `host`: the specialised one when it is (a subdomain of)
/// `multi_step_site`, the generic one otherwise.
pub fn profile_for(host: &str, multi_step_site: &str) -> &'static dyn SiteProfile {
    let host = host.trim().to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let site = multi_step_site.trim().to_lowercase();
    if !site.is_empty() && (host == site || host.ends_with(&format!(".{site}"))) {
        &ANIME_SAMA
    } else {
        &GENERIC
    }
}
