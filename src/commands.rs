//! Client command handlers.
//!
//! These talk to a running server over HTTP and keep the local
//! conversion history.

use crate::client::{
    ApiClient, FallbackPolicy, IssuedLink, LinkSource, ShortenApi, ShortenClient,
};
use crate::config::Config;
use crate::error::AppResult;
use crate::history::{History, HistoryEntry, HistoryStore};
use clap::Subcommand;
use std::time::Duration;
use tracing::{error, info};

/// Client commands available via CLI.
#[derive(Subcommand, Debug)]
pub enum ClientCommands {
    /// Shorten a URL and record it in the history
    Shorten {
        /// URL to shorten; `https://` is added when no scheme is given
        url: String,

        /// Issue a new code even if the URL was shortened before
        #[arg(long)]
        force_new: bool,

        /// Override FALLBACK_POLICY for this call
        #[arg(long, value_enum)]
        fallback: Option<FallbackPolicy>,
    },

    /// Show the original URL behind a short code
    Resolve { short_code: String },

    /// Delete a short code
    Delete { short_code: String },

    /// Print the recent conversion history, newest first
    History,

    /// Forget the conversion history
    ClearHistory,
}

/// Run a client command with the given configuration.
pub async fn run(config: Config, command: ClientCommands) -> AppResult<()> {
    match command {
        ClientCommands::Shorten {
            url,
            force_new,
            fallback,
        } => shorten(&config, &url, force_new, fallback).await,
        ClientCommands::Resolve { short_code } => resolve(&config, &short_code).await,
        ClientCommands::Delete { short_code } => delete(&config, &short_code).await,
        ClientCommands::History => show_history(&config),
        ClientCommands::ClearHistory => clear_history(&config),
    }
}

fn api_client(config: &Config) -> AppResult<ApiClient> {
    ApiClient::new(
        &config.client.api_base_url,
        Duration::from_secs(config.client.timeout_seconds),
    )
}

fn history_store(config: &Config) -> HistoryStore {
    HistoryStore::new(config.history.file.clone())
}

async fn shorten(
    config: &Config,
    url: &str,
    force_new: bool,
    fallback: Option<FallbackPolicy>,
) -> AppResult<()> {
    let policy = fallback.unwrap_or(config.client.fallback_policy);
    let client = ShortenClient::new(api_client(config)?, policy, &config.client.fallback_base_url);

    let link = shorten_and_record(config, &client, url, force_new).await?;

    match link.source {
        LinkSource::Backend => println!("{}", link.short_url),
        LinkSource::LocalFallback => println!(
            "{}  (generated locally: the API was unavailable, this link does not resolve)",
            link.short_url
        ),
    }

    Ok(())
}

/// Shorten through `client` and push the result onto the stored history.
///
/// Nothing is recorded when shortening fails. A failure to save the history
/// is logged; the link is still returned.
pub async fn shorten_and_record<A: ShortenApi>(
    config: &Config,
    client: &ShortenClient<A>,
    url: &str,
    force_new: bool,
) -> AppResult<IssuedLink> {
    let link = client.shorten(url, force_new).await?;

    let entry = match link.source {
        LinkSource::Backend => HistoryEntry::new(&link.original_url, &link.short_url),
        LinkSource::LocalFallback => HistoryEntry::local_fallback(&link.original_url, &link.short_url),
    };

    let store = history_store(config);
    let mut history = store.load_history(&config.history.key, config.history.capacity);
    history.push(entry);
    if let Err(e) = store.save_history(&config.history.key, &history) {
        error!("Error saving history: {}", e);
    }

    Ok(link)
}

async fn resolve(config: &Config, short_code: &str) -> AppResult<()> {
    let info = api_client(config)?.resolve(short_code).await?;
    println!("{}", info.original_url);
    Ok(())
}

async fn delete(config: &Config, short_code: &str) -> AppResult<()> {
    api_client(config)?.delete(short_code).await?;
    info!("Deleted {}", short_code);
    Ok(())
}

fn show_history(config: &Config) -> AppResult<()> {
    let history = history_store(config).load_history(&config.history.key, config.history.capacity);
    print!("{}", format_history(&history));
    Ok(())
}

fn clear_history(config: &Config) -> AppResult<()> {
    if history_store(config).remove(&config.history.key)? {
        info!("History cleared");
    } else {
        info!("History was already empty");
    }
    Ok(())
}

/// One line per entry: timestamp, short link, original URL. Locally
/// generated links are flagged.
pub fn format_history(history: &History) -> String {
    if history.is_empty() {
        return "No history yet\n".to_string();
    }

    history
        .entries()
        .iter()
        .map(|entry| {
            format!(
                "{}  {}  {}{}\n",
                entry.created_at.format("%Y-%m-%d %H:%M"),
                entry.short,
                entry.original,
                if entry.fallback {
                    "  [local fallback, does not resolve]"
                } else {
                    ""
                }
            )
        })
        .collect()
}
