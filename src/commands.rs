//! Text commands and their replies.
//!
//! A command is one line of text such as `link sibnet one piece --episode 12`.
//! Parsing validates the arguments; [`execute`] runs the command against a
//! [`Resolver`] and renders a plain-text reply. Nothing here touches the
//! engine's internals: the crawler, navigator and provider normaliser are
//! reached only through the resolver.

use std::fmt::Write as _;

use linkfinder_search::{
    Candidate, NavigationOutcome, Renderer, ResolutionResult, ResolutionSource, Resolver,
    SearchEngineTrait,
};

use crate::error::{LinkfinderError, Result};

/// Titles longer than this are cut in `find` replies.
const MAX_TITLE_CHARS: usize = 80;

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Rank pages of `site` for `keyword`.
    Find { site: String, keyword: String },
    /// Resolve one link on `site` (or the provider alias).
    Link {
        site: String,
        keyword: String,
        episode: Option<u32>,
    },
    /// Turbo path on the multi-step site.
    Fast {
        query: String,
        direct_url: Option<String>,
    },
    /// Rewrite a provider URL into its share link.
    Normalize { url: String },
}

/// Usage text listing every command.
pub const HELP: &str = "\
Commands:
  find <site> <keyword>                   rank matching pages on a site
  link <site|alias> <keyword> [--episode N]  best single link
  fast <keywords> [--url <page>]          turbo path on the catalogue site
  normalize <url>                         provider share link

Examples:
  find anime-sama.fr naruto
  link sibnet ONE PIECE
  link anime-sama.fr ONE PIECE --episode 1089
  fast ONE PIECE 1000 VF";

/// Parse one command line. The command word is case-insensitive.
///
/// # Errors
///
/// Returns [`LinkfinderError::Usage`] for an unknown command, missing
/// arguments, or a site that does not look like a host or URL.
pub fn parse_command(line: &str) -> Result<Command> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Err(usage("empty command"));
    };
    let rest: Vec<&str> = words.collect();

    match verb.to_lowercase().as_str() {
        "find" => {
            let [site, keyword @ ..] = rest.as_slice() else {
                return Err(usage("find <site> <keyword>"));
            };
            if keyword.is_empty() {
                return Err(usage("find <site> <keyword>"));
            }
            validate_site(site)?;
            Ok(Command::Find {
                site: (*site).to_owned(),
                keyword: keyword.join(" "),
            })
        }
        "link" => {
            let [site, tail @ ..] = rest.as_slice() else {
                return Err(usage("link <site|alias> <keyword> [--episode N]"));
            };
            let (keyword, episode) = parse_episode_flag(tail);
            if keyword.is_empty() {
                return Err(usage("missing keyword"));
            }
            Ok(Command::Link {
                site: (*site).to_owned(),
                keyword,
                episode,
            })
        }
        "fast" => {
            let (query, direct_url) = take_option(&rest, "--url");
            if query.is_empty() {
                return Err(usage("fast <keywords> [--url <page>]"));
            }
            Ok(Command::Fast { query, direct_url })
        }
        "normalize" => match rest.as_slice() {
            [url] => Ok(Command::Normalize {
                url: (*url).to_owned(),
            }),
            _ => Err(usage("normalize <url>")),
        },
        other => Err(usage(&format!("unknown command {other:?}"))),
    }
}

/// Split `--episode N` out of `words`.
///
/// A flag without a valid number is dropped and leaves no episode.
pub fn parse_episode_flag(words: &[&str]) -> (String, Option<u32>) {
    let mut episode = None;
    let mut rest = Vec::with_capacity(words.len());
    let mut iter = words.iter();
    while let Some(word) = iter.next() {
        if *word == "--episode" {
            episode = iter.next().and_then(|n| n.parse().ok());
        } else {
            rest.push(*word);
        }
    }
    (rest.join(" "), episode)
}

fn take_option(words: &[&str], flag: &str) -> (String, Option<String>) {
    let mut value = None;
    let mut rest = Vec::with_capacity(words.len());
    let mut iter = words.iter();
    while let Some(word) = iter.next() {
        if *word == flag {
            value = iter.next().map(|v| (*v).to_owned());
        } else {
            rest.push(*word);
        }
    }
    (rest.join(" "), value)
}

/// A site must carry an http(s) scheme or at least look like a host name.
///
/// # Errors
///
/// Returns [`LinkfinderError::Usage`] otherwise.
pub fn validate_site(site: &str) -> Result<()> {
    let lower = site.to_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") || site.contains('.') {
        Ok(())
    } else {
        Err(usage(&format!(
            "invalid site {site:?}: use a form like site.com or https://site.com"
        )))
    }
}

fn usage(message: &str) -> LinkfinderError {
    LinkfinderError::Usage(message.to_owned())
}

/// Quality band of a relevance score, as shown in `find` replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreTier {
    /// 95 and above.
    Excellent,
    /// 90 to 95.
    Great,
    /// 85 to 90.
    Good,
    /// Below 85.
    Fair,
}

impl ScoreTier {
    /// Band for `score`.
    pub fn of(score: f64) -> Self {
        if score >= 95.0 {
            Self::Excellent
        } else if score >= 90.0 {
            Self::Great
        } else if score >= 85.0 {
            Self::Good
        } else {
            Self::Fair
        }
    }

    /// Short marker printed before a result.
    pub fn marker(self) -> &'static str {
        match self {
            Self::Excellent => "[***]",
            Self::Great => "[** ]",
            Self::Good => "[*  ]",
            Self::Fair => "[   ]",
        }
    }
}

fn truncate_title(title: &str) -> String {
    if title.chars().count() > MAX_TITLE_CHARS {
        let cut: String = title.chars().take(MAX_TITLE_CHARS).collect();
        format!("{cut}...")
    } else {
        title.to_owned()
    }
}

/// Reply for `find`.
pub fn format_find(site: &str, keyword: &str, results: &[Candidate]) -> String {
    if results.is_empty() {
        return format!("No sufficiently precise result for \"{keyword}\" on {site}.");
    }
    let mut out = format!("Results for \"{keyword}\" on {site}:\n");
    for candidate in results {
        let _ = write!(
            out,
            "\n{} {} ({:.1})\n{}\n",
            ScoreTier::of(candidate.score).marker(),
            truncate_title(&candidate.title),
            candidate.score,
            candidate.url
        );
    }
    out.push_str("\nscore = relevance (100 = perfect)");
    out
}

/// Reply for `link`.
pub fn format_link(result: &ResolutionResult) -> String {
    let headline = match result.source {
        ResolutionSource::ProviderDirect => "Normalized provider link".to_owned(),
        ResolutionSource::ProviderSearch => "Found on the provider".to_owned(),
        ResolutionSource::SiteSearch => match result.score {
            Some(score) => format!("Found on the site (score: {score:.1})"),
            None => "Found on the site".to_owned(),
        },
        ResolutionSource::ProviderSearchFailed | ResolutionSource::None => {
            let mut out = String::from("No reliable link found.");
            if !result.title.is_empty() {
                let _ = write!(out, "\n{}", result.title);
            }
            if let Some(reason) = &result.reason {
                let _ = write!(out, "\nReason: {reason}");
            }
            if !result.page.is_empty() {
                let _ = write!(out, "\nPage: {}", result.page);
            }
            return out;
        }
    };

    let title = if result.title.is_empty() {
        "n/a"
    } else {
        result.title.as_str()
    };
    let mut out = format!("{headline}\nTitle: {title}\nLink: {}", result.link);
    if !result.page.is_empty() && result.page != result.link {
        let _ = write!(out, "\nPage: {}", result.page);
    }
    if let Some(reason) = &result.reason {
        let _ = write!(out, "\n{reason}");
    }
    out
}

/// Reply for `fast`.
pub fn format_fast(query: &str, outcome: &NavigationOutcome) -> String {
    if !outcome.matched {
        let mut out = String::from("No reliable player found.");
        if !outcome.page_url.is_empty() {
            let _ = write!(out, "\nPage: {}", outcome.page_url);
        }
        let _ = write!(out, "\nReason: {}\nQuery: {query}", outcome.why);
        return out;
    }

    let episode = if outcome.episode.found {
        outcome.episode.matched_label.as_str()
    } else {
        "(default)"
    };
    let player = if outcome.player_label.is_empty() {
        "unknown"
    } else {
        outcome.player_label.as_str()
    };
    format!(
        "{}\nEpisode: {episode}\nPlayer: {player}\nLink: {}\nPage: {}\n{}",
        outcome.title, outcome.final_url, outcome.page_url, outcome.why
    )
}

/// Reply for `normalize`.
pub fn format_normalize(url: &str, normalized: Option<&str>) -> String {
    match normalized {
        Some(link) => link.to_owned(),
        None => format!("Not a provider link: {url}"),
    }
}

/// Run `command` and render its reply.
///
/// `top_k` bounds the number of pages listed by `find`.
///
/// # Errors
///
/// Returns an error when `find` cannot crawl the site at all. Every other
/// command reports failures inside its reply.
pub async fn execute<R: Renderer, E: SearchEngineTrait>(
    command: &Command,
    resolver: &Resolver<R, E>,
    top_k: usize,
) -> Result<String> {
    match command {
        Command::Find { site, keyword } => {
            tracing::debug!(site, "find");
            let results = resolver.crawl_site(site, keyword, top_k).await?;
            Ok(format_find(site, keyword, &results))
        }
        Command::Link {
            site,
            keyword,
            episode,
        } => {
            let result = resolver.resolve(site, keyword, *episode).await;
            tracing::info!(source = %result.source, "link resolved");
            Ok(format_link(&result))
        }
        Command::Fast { query, direct_url } => {
            let outcome = resolver.fast_resolve(query, direct_url.as_deref()).await;
            tracing::info!(state = %outcome.state, matched = outcome.matched, "fast finished");
            Ok(format_fast(query, &outcome))
        }
        Command::Normalize { url } => {
            let normalized = resolver.normalizer().normalize(url);
            Ok(format_normalize(url, normalized.as_deref()))
        }
    }
}
