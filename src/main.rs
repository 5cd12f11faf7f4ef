//! # SUZ News
//!
//! Watches the news listing of the SUZ CVUT website and announces every new
//! article in a Discord channel, linking a Wayback Machine copy of it.
//!
//! ## Usage
//!
//! ```sh
//! SUZ_AUTH_TOKEN=... SUZ_CHANNEL_ID=1234 SUZ_SLEEP_MINS=15 suz_news
//! ```
//!
//! ## Architecture
//!
//! Every poll runs the same cycle:
//! 1. **Extracting**: scrape the listing page (newest article first)
//! 2. **History**: read the bot's recent messages to learn what was announced
//! 3. **Deciding**: keep the unannounced articles, oldest first
//! 4. **Publishing**: archive each article, post it, cross-post it
//! 5. **Root archive**: if anything was posted, archive the listing page too
//!
//! The channel history is the only state; there is no database.

use clap::Parser;
use clap::error::ErrorKind;
use std::error::Error;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod archive;
mod chat;
mod cli;
mod dedup;
mod discord;
mod error;
mod history;
mod models;
mod pipeline;
mod publisher;
mod render;
mod scrapers;
#[cfg(test)]
mod testing;
mod utils;

use archive::{WAYBACK_BASE, WaybackArchiver};
use cli::{Cli, Config};
use discord::DiscordConnector;
use pipeline::{Pipeline, PipelineSettings};
use scrapers::suz::SuzScraper;

/// Upper bound for a single HTTP request; archive submissions can be slow.
const HTTP_TIMEOUT: Duration = Duration::from_secs(120);

fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "suz_news starting up");

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            error!(error = %e, "Failed to read/parse all the env vars");
            return Err(e.into());
        }
    };
    let config = match Config::from_cli(cli) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };
    // SAFETY: the runtime is not built yet, so this is the only thread.
    unsafe { cli::clear_environment() };
    info!(?config, "Loaded configuration");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(config))
}

async fn run(config: Config) -> Result<(), Box<dyn Error>> {
    let client = reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .timeout(HTTP_TIMEOUT)
        .build()?;

    let scraper = SuzScraper::new(client.clone(), &config.domain)?;
    let settings = PipelineSettings {
        channel_id: config.channel_id.clone(),
        history_limit: config.history_limit,
        strategy: config.strategy,
        root_url: scraper.listing_url(),
        poll_interval: config.poll_interval,
    };
    let archiver = WaybackArchiver::new(client.clone(), WAYBACK_BASE);
    let chat = DiscordConnector::new(client, config.auth_token.clone(), &config.discord_api);

    let pipeline = Pipeline::new(scraper, archiver, chat, settings);
    match pipeline.run_forever().await {
        Ok(never) => match never {},
        Err(e) => {
            error!(error = %e, "Fatal error, shutting down");
            Err(e.into())
        }
    }
}
