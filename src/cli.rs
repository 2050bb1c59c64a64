//! Command-line interface definitions for Travel Newsbot.
//!
//! All arguments can be provided via command-line flags or environment
//! variables, so the same binary runs from a shell or a container.

use clap::Parser;

use crate::error::ConfigError;
use crate::http::DEFAULT_TIMEOUT_SECS;
use crate::publish::TELEGRAM_API;

/// Command-line arguments for the Travel Newsbot service.
///
/// # Examples
///
/// ```sh
/// # Post hourly to a channel
/// BOT_TOKEN=123:abc CHANNEL_ID=@travel travel_newsbot
///
/// # One cycle with custom sources, printing instead of posting
/// travel_newsbot --sources sources.yaml --once --dry-run
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// YAML file listing sources (built-in sources when omitted)
    #[arg(short, long, env = "NEWSBOT_SOURCES")]
    pub sources: Option<String>,

    /// SQLite file remembering already posted links
    #[arg(short, long, env = "NEWSBOT_DB", default_value = "posted.db")]
    pub db_path: String,

    /// Telegram bot token
    #[arg(long, env = "BOT_TOKEN", hide_env_values = true)]
    pub bot_token: Option<String>,

    /// Target channel: @name or -100xxxxxxxxxx
    #[arg(long, env = "CHANNEL_ID")]
    pub channel_id: Option<String>,

    /// Bot API root URL
    #[arg(long, env = "TELEGRAM_API", default_value = TELEGRAM_API)]
    pub telegram_api: String,

    /// Seconds between cycles
    #[arg(long, env = "CHECK_INTERVAL_SECS", default_value_t = 3600)]
    pub interval_secs: u64,

    /// Seconds before the first cycle
    #[arg(long, default_value_t = 10)]
    pub first_delay_secs: u64,

    /// Timeout for every outbound request, in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Run a single cycle and exit
    #[arg(long)]
    pub once: bool,

    /// Log items instead of posting them
    #[arg(long)]
    pub dry_run: bool,
}

/// Where delivered items go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Telegram { token: String, chat_id: String },
    DryRun,
}

impl Cli {
    /// Resolve the delivery target.
    ///
    /// # Errors
    ///
    /// [`ConfigError::MissingDestination`] when not in dry-run mode and the
    /// token or channel is missing.
    pub fn destination(&self) -> Result<Destination, ConfigError> {
        if self.dry_run {
            return Ok(Destination::DryRun);
        }
        let token = non_empty(&self.bot_token).ok_or(ConfigError::MissingDestination("BOT_TOKEN"))?;
        let chat_id =
            non_empty(&self.channel_id).ok_or(ConfigError::MissingDestination("CHANNEL_ID"))?;
        Ok(Destination::Telegram { token, chat_id })
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
