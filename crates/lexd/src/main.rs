//! lexd - command-line dictionary client

mod handler;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lexdict::{AuthState, Dictionary, DictionaryConfig, Session, SyncOutcome};
use tracing::{info, warn};

use crate::handler::CommandHandler;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Data directory
    #[arg(short, long, env = "LEXD_DATA_DIR", default_value = lexdict::config::DEFAULT_DATA_DIR)]
    data: String,

    /// Lexical API base URL
    #[arg(long, env = "LEXD_API_BASE", default_value = lexdict::config::DEFAULT_API_BASE)]
    api_base: String,

    /// Remote synced store project URL
    #[arg(long, env = "LEXD_REMOTE_URL", requires = "remote_key")]
    remote_url: Option<String>,

    /// Remote synced store API key
    #[arg(long, env = "LEXD_REMOTE_KEY", hide_env_values = true)]
    remote_key: Option<String>,

    /// Access token of a signed-in user
    #[arg(long, env = "LEXD_ACCESS_TOKEN", hide_env_values = true, requires = "user_id")]
    access_token: Option<String>,

    /// Id of the signed-in user
    #[arg(long, env = "LEXD_USER_ID")]
    user_id: Option<String>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub(crate) enum Command {
    /// Look up a word and record it in the history
    Lookup {
        /// Word to look up
        word: String,
    },
    /// List or change favorites
    Favorites {
        #[command(subcommand)]
        action: Option<FavoritesAction>,
    },
    /// List or clear the history
    History {
        #[command(subcommand)]
        action: Option<HistoryAction>,
    },
    /// Browse the remote word catalogue
    Words {
        /// Zero-based page
        #[arg(short, long, default_value_t = 0)]
        page: usize,

        /// Ask the catalogue for its exact size
        #[arg(long)]
        count: bool,
    },
    /// Prefix search in the remote word catalogue
    Search {
        /// Word prefix
        prefix: String,

        /// Maximum number of results
        #[arg(short, long, default_value_t = lexdict::DEFAULT_SEARCH_LIMIT)]
        limit: usize,
    },
    /// Manage the lookup cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// Reclaim space in the local data file
    Compact,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub(crate) enum FavoritesAction {
    /// Show all favorites
    List,
    /// Add a favorite
    Add { word: String },
    /// Remove a favorite
    Remove { word: String },
    /// Add the word if absent, remove it otherwise
    Toggle { word: String },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub(crate) enum HistoryAction {
    /// Show the history, most recent first
    List,
    /// Delete the whole history
    Clear,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub(crate) enum CacheAction {
    /// Drop every cached entry
    Clear,
    /// Drop the cached entry for one word
    Remove { word: String },
}

impl Args {
    fn config(&self) -> DictionaryConfig {
        let config = DictionaryConfig::new(&self.data).with_api_base_url(&self.api_base);
        match (&self.remote_url, &self.remote_key) {
            (Some(url), Some(key)) => config.with_remote(url, key),
            _ => config,
        }
    }

    fn auth_state(&self) -> AuthState {
        match (&self.user_id, &self.access_token) {
            (Some(user_id), Some(token)) => {
                AuthState::Authenticated(Session::new(user_id.as_str(), token.as_str()))
            }
            _ => AuthState::Anonymous,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so command output stays pipeable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    info!("Starting lexd v{}", env!("CARGO_PKG_VERSION"));
    info!("Data directory: {}", args.data);

    let dictionary = Dictionary::open(args.config()).context("failed to open dictionary")?;

    let outcome = dictionary.controller().set_auth_state(args.auth_state()).await;
    if outcome == SyncOutcome::LocalFallback {
        warn!("remote store unavailable, showing local data");
    }

    let handler = CommandHandler::new(&dictionary, args.json);
    let output = handler.handle(args.command).await;
    dictionary.close().context("failed to close data directory")?;

    let output = output?;
    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}
