//! Configuration for the linkfinder front-end.
//!
//! A single TOML file holds the engine settings under `[search]` plus a
//! few front-end knobs. Every section is optional; missing fields take
//! their defaults. A couple of environment variables override the file so
//! deployments can tune the common knobs without editing it.

use std::path::{Path, PathBuf};

use linkfinder_search::SearchConfig;
use serde::{Deserialize, Serialize};

use crate::error::{LinkfinderError, Result};

/// Overrides `search.results_per_query`.
pub const ENV_MAX_RESULTS: &str = "LINKFINDER_MAX_RESULTS";
/// Overrides `search.browser.headless` (`true`/`false`, `1`/`0`, `yes`/`no`).
pub const ENV_HEADLESS: &str = "LINKFINDER_HEADLESS";

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkfinderConfig {
    /// Resolution engine settings.
    pub search: SearchConfig,
    /// Log filter used when `RUST_LOG` is unset.
    pub log_filter: Option<String>,
}

impl LinkfinderConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| LinkfinderError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| LinkfinderError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `<config dir>/linkfinder/config.toml`.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| std::env::temp_dir().join("linkfinder-config"))
            .join("linkfinder")
            .join("config.toml")
    }

    /// Resolve the effective configuration.
    ///
    /// An explicit path must exist. Without one, the default path is used
    /// when present and built-in defaults otherwise. Environment overrides
    /// are applied last, then the engine settings are validated.
    ///
    /// # Errors
    ///
    /// Returns an error for an unreadable file, a bad override value, or an
    /// invalid engine configuration.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = Self::default_config_path();
                if path.is_file() {
                    tracing::debug!(path = %path.display(), "loading default config");
                    Self::from_file(&path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.search.validate()?;
        Ok(config)
    }

    /// Apply overrides read through `lookup` (the process environment in
    /// production).
    ///
    /// # Errors
    ///
    /// Returns [`LinkfinderError::Config`] for an unparseable value.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(raw) = lookup(ENV_MAX_RESULTS) {
            let value: usize = raw.trim().parse().map_err(|_| {
                LinkfinderError::Config(format!("{ENV_MAX_RESULTS} must be a positive integer, got {raw:?}"))
            })?;
            self.search.results_per_query = value;
        }
        if let Some(raw) = lookup(ENV_HEADLESS) {
            self.search.browser.headless = parse_flag(&raw).ok_or_else(|| {
                LinkfinderError::Config(format!("{ENV_HEADLESS} must be true or false, got {raw:?}"))
            })?;
        }
        Ok(())
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = LinkfinderConfig::default();
        assert!(config.search.validate().is_ok());
        assert_eq!(config.search.results_per_query, 3);
        assert!(config.log_filter.is_none());
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = LinkfinderConfig::default();
        config.search.crawl.max_pages = 25;
        config.search.provider.verify_links = true;
        config.log_filter = Some("linkfinder=debug".into());
        config.save_to_file(&path).unwrap();

        let loaded = LinkfinderConfig::from_file(&path).unwrap();
        assert_eq!(loaded.search.crawl.max_pages, 25);
        assert!(loaded.search.provider.verify_links);
        assert_eq!(loaded.log_filter.as_deref(), Some("linkfinder=debug"));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[search.crawl]\nmax_depth = 1\n").unwrap();

        let loaded = LinkfinderConfig::from_file(&path).unwrap();
        assert_eq!(loaded.search.crawl.max_depth, 1);
        assert_eq!(loaded.search.crawl.max_pages, 60);
        assert_eq!(loaded.search.multi_step_site, "anime-sama.fr");
    }

    #[test]
    fn from_file_invalid_toml_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "this is not valid toml {{{").unwrap();
        assert!(matches!(
            LinkfinderConfig::from_file(&path),
            Err(LinkfinderError::Config(_))
        ));
    }

    #[test]
    fn from_file_nonexistent_returns_error() {
        let result = LinkfinderConfig::from_file(Path::new("/nonexistent/linkfinder/config.toml"));
        assert!(matches!(result, Err(LinkfinderError::Io(_))));
    }

    #[test]
    fn explicit_missing_path_fails_load() {
        assert!(LinkfinderConfig::load(Some(Path::new("/nonexistent/config.toml"))).is_err());
    }

    #[test]
    fn default_config_path_ends_with_config_toml() {
        let path = LinkfinderConfig::default_config_path();
        let path_str = path.to_string_lossy();
        assert!(path_str.ends_with("config.toml"));
        assert!(path_str.contains("linkfinder"));
    }

    #[test]
    fn overrides_apply() {
        let mut config = LinkfinderConfig::default();
        config
            .apply_overrides(lookup(&[(ENV_MAX_RESULTS, "5"), (ENV_HEADLESS, "no")]))
            .unwrap();
        assert_eq!(config.search.results_per_query, 5);
        assert!(!config.search.browser.headless);
    }

    #[test]
    fn bad_override_is_rejected() {
        let mut config = LinkfinderConfig::default();
        let err = config
            .apply_overrides(lookup(&[(ENV_MAX_RESULTS, "many")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_MAX_RESULTS));

        let err = config
            .apply_overrides(lookup(&[(ENV_HEADLESS, "maybe")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_HEADLESS));
    }

    #[test]
    fn absent_overrides_change_nothing() {
        let mut config = LinkfinderConfig::default();
        config.apply_overrides(lookup(&[])).unwrap();
        assert_eq!(config.search.results_per_query, 3);
        assert!(config.search.browser.headless);
    }
}
