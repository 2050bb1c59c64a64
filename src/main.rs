//! # Travel Newsbot
//!
//! Service entry point: reads the CLI and sources file, opens the dedup
//! store, and runs ingestion cycles on a fixed interval until interrupted.
//!
//! ## Usage
//!
//! ```sh
//! BOT_TOKEN=123:abc CHANNEL_ID=@travel travel_newsbot --db-path /data/posted.db
//! ```
//!
//! ## Lifecycle
//!
//! 1. **Startup**: missing destination or invalid sources abort here
//! 2. **Schedule**: first cycle after `--first-delay-secs`, then every `--interval-secs`
//! 3. **Shutdown**: Ctrl-C is honoured between cycles; a running cycle finishes

use std::error::Error;
use std::pin::pin;
use std::time::Duration;

use clap::Parser;
use tokio::signal;
use tokio::time::{MissedTickBehavior, interval, sleep};
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

use travel_newsbot::cli::{Cli, Destination};
use travel_newsbot::config::SourcesConfig;
use travel_newsbot::http::{DEFAULT_USER_AGENT, Session};
use travel_newsbot::normalize::ItemNormalizer;
use travel_newsbot::publish::{LogPublisher, Publisher, TelegramPublisher};
use travel_newsbot::store::{DedupStore, SqliteStore};
use travel_newsbot::IngestionCycle;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!(version = env!("CARGO_PKG_VERSION"), "travel_newsbot starting up");

    let args = Cli::parse();
    debug!(?args.sources, db_path = %args.db_path, once = args.once, dry_run = args.dry_run, "Parsed CLI arguments");

    let destination = match args.destination() {
        Ok(destination) => destination,
        Err(e) => {
            error!(error = %e, "Missing required configuration");
            return Err(e.into());
        }
    };

    let config = SourcesConfig::load(args.sources.as_deref()).await?;
    let session = Session::new(Duration::from_secs(args.timeout_secs), DEFAULT_USER_AGENT)?;
    let store = SqliteStore::open(&args.db_path).await?;
    let normalizer = ItemNormalizer::new(&config.blocked_keywords);

    match destination {
        Destination::Telegram { token, chat_id } => {
            info!(%chat_id, "Posting to Telegram channel");
            let publisher = TelegramPublisher::new(&session, &args.telegram_api, token, chat_id);
            let cycle = IngestionCycle::new(
                config.sources.clone(),
                &session,
                normalizer,
                store.clone(),
                publisher,
            );
            schedule(&cycle, &args).await;
        }
        Destination::DryRun => {
            info!("Dry run: items will be logged, not posted");
            let cycle = IngestionCycle::new(
                config.sources.clone(),
                &session,
                normalizer,
                store.clone(),
                LogPublisher,
            );
            schedule(&cycle, &args).await;
        }
    }

    store.close().await;

    let elapsed = start_time.elapsed();
    info!(?elapsed, secs = elapsed.as_secs(), "Shutdown complete");
    Ok(())
}

/// Run cycles until Ctrl-C, or exactly one with `--once`.
#[instrument(level = "info", skip_all)]
async fn schedule<S, P>(cycle: &IngestionCycle<S, P>, args: &Cli)
where
    S: DedupStore,
    P: Publisher,
{
    if args.once {
        cycle.run_once().await;
        return;
    }

    let mut shutdown = pin!(signal::ctrl_c());

    tokio::select! {
        _ = sleep(Duration::from_secs(args.first_delay_secs)) => {}
        _ = &mut shutdown => {
            info!("Shutdown requested before first cycle");
            return;
        }
    }

    let mut ticker = interval(Duration::from_secs(args.interval_secs.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(interval_secs = args.interval_secs, "Scheduler started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let report = cycle.run_once().await;
                debug!(?report, "Cycle report");
            }
            _ = &mut shutdown => {
                info!("Shutdown requested");
                break;
            }
        }
    }
}
