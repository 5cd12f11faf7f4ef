//! Startup configuration.
//!
//! Every option is read from the process environment (the long flag of the
//! same name works too, mainly for local runs). [`Cli`] is turned into an
//! immutable [`Config`] that is handed to each component; nothing reads the
//! environment after startup, and the secret-bearing variables are removed
//! from it with [`clear_environment`].

use crate::dedup::Strategy;
use crate::discord::{API_BASE, MAX_HISTORY_LIMIT};
use crate::error::{Error, Result};
use clap::Parser;
use std::fmt;
use std::time::Duration;

pub const ENV_AUTH_TOKEN: &str = "SUZ_AUTH_TOKEN";
pub const ENV_CHANNEL_ID: &str = "SUZ_CHANNEL_ID";
pub const ENV_SLEEP_MINS: &str = "SUZ_SLEEP_MINS";

/// Variables wiped from the environment once the configuration is parsed.
pub const SECRET_ENV_VARS: [&str; 3] = [ENV_AUTH_TOKEN, ENV_CHANNEL_ID, ENV_SLEEP_MINS];

/// Command-line / environment options.
///
/// # Examples
///
/// ```sh
/// SUZ_AUTH_TOKEN=... SUZ_CHANNEL_ID=1234 SUZ_SLEEP_MINS=15 suz_news
///
/// # date-watermark deduplication against a staging site
/// SUZ_STRATEGY=date SUZ_DOMAIN=staging.suz.cvut.cz suz_news
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Discord bot token
    #[arg(long, env = ENV_AUTH_TOKEN, hide_env_values = true)]
    pub auth_token: String,

    /// Channel the announcements are posted to
    #[arg(long, env = ENV_CHANNEL_ID)]
    pub channel_id: String,

    /// Minutes to sleep between two polls
    #[arg(long, env = ENV_SLEEP_MINS, value_parser = clap::value_parser!(u64).range(1..))]
    pub sleep_mins: u64,

    /// Domain of the news site
    #[arg(long, env = "SUZ_DOMAIN", default_value = "suz.cvut.cz")]
    pub domain: String,

    /// How many recent channel messages are checked for earlier announcements
    #[arg(long, env = "SUZ_HISTORY_LIMIT", default_value_t = 32,
          value_parser = clap::value_parser!(u8).range(1..=i64::from(MAX_HISTORY_LIMIT)))]
    pub history_limit: u8,

    /// How already announced articles are recognised
    #[arg(long, env = "SUZ_STRATEGY", value_enum, default_value_t = Strategy::Url)]
    pub strategy: Strategy,

    /// Discord REST API base URL
    #[arg(long, env = "SUZ_DISCORD_API", default_value = API_BASE)]
    pub discord_api: String,
}

/// Validated, immutable runtime configuration.
#[derive(Clone)]
pub struct Config {
    pub auth_token: String,
    pub channel_id: String,
    pub poll_interval: Duration,
    pub domain: String,
    pub history_limit: u8,
    pub strategy: Strategy,
    pub discord_api: String,
}

impl Config {
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let auth_token = cli.auth_token.trim().to_string();
        if auth_token.is_empty() {
            return Err(Error::Config(format!("{ENV_AUTH_TOKEN} is empty")));
        }
        let channel_id = cli.channel_id.trim().to_string();
        if channel_id.is_empty() {
            return Err(Error::Config(format!("{ENV_CHANNEL_ID} is empty")));
        }
        let domain = cli.domain.trim().trim_end_matches('/').to_string();
        if domain.is_empty() {
            return Err(Error::Config("SUZ_DOMAIN is empty".to_string()));
        }

        Ok(Self {
            auth_token,
            channel_id,
            poll_interval: Duration::from_secs(cli.sleep_mins.saturating_mul(60)),
            domain,
            history_limit: cli.history_limit,
            strategy: cli.strategy,
            discord_api: cli.discord_api,
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("auth_token", &"<redacted>")
            .field("channel_id", &self.channel_id)
            .field("poll_interval", &self.poll_interval)
            .field("domain", &self.domain)
            .field("history_limit", &self.history_limit)
            .field("strategy", &self.strategy)
            .field("discord_api", &self.discord_api)
            .finish()
    }
}

/// Remove the secret-bearing variables from the process environment.
///
/// # Safety
///
/// Must be called while the process is still single-threaded (before the
/// async runtime is built); see [`std::env::remove_var`].
pub unsafe fn clear_environment() {
    for key in SECRET_ENV_VARS {
        // SAFETY: upheld by the caller, no other thread is running.
        unsafe { std::env::remove_var(key) };
    }
}
