//! Share-link normalisation for the video provider.
//!
//! The provider exposes the same video under several URL shapes. Embed
//! players carry a numeric id in a query parameter; the public share page
//! lives at `/video<id>` (optionally followed by a descriptive slug). The
//! provider answers automated in-site search with a human challenge, so
//! keyword lookups for it always go through external search instead.

use std::sync::OnceLock;

use regex::Regex;

use crate::config::ProviderConfig;
use crate::error::SearchError;

fn embed_id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(?:shell|frame)\.php\?videoid=(\d+)").expect("valid regex"))
}

fn share_path_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)/video\d+").expect("valid regex"))
}

/// Recognises and rewrites provider URLs into canonical share links.
#[derive(Debug, Clone)]
pub struct ProviderLinkNormalizer {
    config: ProviderConfig,
}

impl ProviderLinkNormalizer {
    /// Create a normaliser for the configured provider.
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }

    /// Provider settings.
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Whether `text` mentions the provider at all (case-insensitive).
    pub fn references_provider(&self, text: &str) -> bool {
        text.to_lowercase()
            .contains(&self.config.marker.to_lowercase())
    }

    /// Rewrite a provider URL into its share form.
    ///
    /// - `…/shell.php?videoid=N` or `…/frame.php?videoid=N` becomes
    ///   `https://<host>/videoN`
    /// - a URL already containing `/videoN` is returned unchanged, slug
    ///   included; a bare `/videoN…` path is made absolute
    /// - any other URL mentioning the provider is returned unchanged
    ///
    /// Returns `None` when the URL does not reference the provider.
    ///
    /// # Examples
    ///
    /// ```
    /// use linkfinder_search::config::ProviderConfig;
    /// use linkfinder_search::provider::ProviderLinkNormalizer;
    ///
    /// let n = ProviderLinkNormalizer::new(ProviderConfig::default());
    /// assert_eq!(
    ///     n.normalize("https://video.sibnet.ru/shell.php?videoid=4242").as_deref(),
    ///     Some("https://video.sibnet.ru/video4242"),
    /// );
    /// assert_eq!(n.normalize("https://unrelated.com/x"), None);
    /// ```
    pub fn normalize(&self, url: &str) -> Option<String> {
        let url = url.trim();
        if url.is_empty() || !self.references_provider(url) {
            return None;
        }

        if let Some(caps) = embed_id_pattern().captures(url) {
            return Some(format!("https://{}/video{}", self.config.host, &caps[1]));
        }

        if share_path_pattern().is_match(url) && url.starts_with("/video") {
            return Some(format!("https://{}{url}", self.config.host));
        }

        Some(url.to_owned())
    }

    /// Whether `url` normalises to a `/video<id>` share link.
    pub fn is_share_link(&self, url: &str) -> bool {
        self.normalize(url)
            .is_some_and(|n| share_path_pattern().is_match(&n))
    }

    /// Fetch a share link once and keep it only if it answers with success.
    ///
    /// Returns `Ok(true)` when verification is disabled.
    ///
    /// # Errors
    ///
    /// [`SearchError::Http`] if the request itself could not be made.
    pub async fn verify(&self, client: &reqwest::Client, link: &str) -> Result<bool, SearchError> {
        if !self.config.verify_links {
            return Ok(true);
        }
        let response = client
            .get(link)
            .send()
            .await
            .map_err(|e| SearchError::Http(format!("verification request failed: {e}")))?;
        let ok = response.status().is_success();
        tracing::debug!(link, status = %response.status(), ok, "share link verified");
        Ok(ok)
    }
}
