//! CLI binary for linkfinder.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use linkfinder::commands::{self, Command as TextCommand, HELP};
use linkfinder::LinkfinderConfig;
use linkfinder_search::DefaultResolver;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "linkfinder=info,linkfinder_search=info,chromiumoxide=warn";

/// linkfinder: find the best reachable link for a show or episode on a site.
#[derive(Parser)]
#[command(name = "linkfinder", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Option<Command>,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Rank the pages of a site that match a keyword.
    Find {
        /// Host name or URL of the site.
        site: String,
        /// Words to look for.
        #[arg(required = true, num_args = 1..)]
        keyword: Vec<String>,
    },

    /// Resolve one link on a site or on the video provider (by its alias).
    Link {
        /// Host name, URL, or provider alias.
        site: String,
        /// Words to look for.
        #[arg(required = true, num_args = 1..)]
        keyword: Vec<String>,
        /// Episode to select on multi-step sites.
        #[arg(short, long)]
        episode: Option<u32>,
    },

    /// Turbo path on the catalogue site; the first number is the episode.
    Fast {
        /// Free text, e.g. "one piece 1000 vf".
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
        /// Content page to use instead of searching for one.
        #[arg(long)]
        url: Option<String>,
    },

    /// Rewrite a provider URL into its canonical share link.
    Normalize {
        /// Provider URL.
        url: String,
    },

    /// Read commands from stdin, one per line.
    Repl,

    /// Write the effective configuration to the default config path.
    InitConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = LinkfinderConfig::load(cli.config.as_deref())?;

    // Logs go to stderr; stdout carries replies only.
    let default_filter = config.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let resolver = linkfinder_search::default_resolver(config.search.clone())?;
    let top_k = config.search.results_per_query;

    let command = match cli.command.unwrap_or(Command::Repl) {
        Command::Find { site, keyword } => {
            commands::validate_site(&site)?;
            TextCommand::Find {
                site,
                keyword: keyword.join(" "),
            }
        }
        Command::Link {
            site,
            keyword,
            episode,
        } => TextCommand::Link {
            site,
            keyword: keyword.join(" "),
            episode,
        },
        Command::Fast { query, url } => TextCommand::Fast {
            query: query.join(" "),
            direct_url: url,
        },
        Command::Normalize { url } => TextCommand::Normalize { url },
        Command::Repl => return run_repl(&resolver, top_k).await,
        Command::InitConfig => {
            let path = LinkfinderConfig::default_config_path();
            config.save_to_file(&path)?;
            println!("wrote {}", path.display());
            return Ok(());
        }
    };

    let reply = commands::execute(&command, &resolver, top_k).await?;
    println!("{reply}");
    Ok(())
}

async fn run_repl(resolver: &DefaultResolver, top_k: usize) -> anyhow::Result<()> {
    println!("linkfinder v{}", env!("CARGO_PKG_VERSION"));
    println!("{HELP}\n");

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if matches!(trimmed, "quit" | "exit") {
            break;
        }
        if matches!(trimmed, "help" | "/help") {
            println!("{HELP}");
            continue;
        }

        let reply = match commands::parse_command(trimmed) {
            Ok(command) => commands::execute(&command, resolver, top_k).await,
            Err(e) => Err(e),
        };
        match reply {
            Ok(text) => println!("{text}\n"),
            Err(e) => println!("error: {e}\n"),
        }
    }
    Ok(())
}
