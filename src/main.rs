//! # Stream Scout CLI
//!
//! Resolves a live mirror, lists its events and extracts stream candidates,
//! printing the results as JSON.
//!
//! ## Usage
//!
//! ```sh
//! stream_scout events
//! stream_scout streams <EVENT_URL> --report
//! stream_scout sweep --limit 5
//! ```

use clap::Parser;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::error::Error;
use stream_scout::{CachedScout, Event, Scout, ScoutConfig, ScoutService, StreamCandidate};
use tracing::{debug, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;

use cli::{Cli, Command};

/// One event together with its candidates, as printed by `sweep`.
#[derive(Debug, Serialize)]
struct SweepEntry {
    event: Event,
    streams: Vec<StreamCandidate>,
}

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let config = match &args.config {
        Some(path) => ScoutConfig::load(path)?,
        None => ScoutConfig::default(),
    };
    let workers = config.workers;
    let cached = CachedScout::new(ScoutService::new(Scout::new(config)?));

    let json = match args.command {
        Command::Events => {
            let listing = cached.service().listing().await;
            info!(count = listing.events.len(), outcome = ?listing.outcome, "Listing complete");
            render(&listing.events, args.pretty)?
        }
        Command::Streams { url, report } => {
            if report {
                render(&cached.service().extraction(&url).await, args.pretty)?
            } else {
                render(&cached.streams(&url).await, args.pretty)?
            }
        }
        Command::Sweep { limit } => {
            let events = cached.events().await;
            let take = limit.unwrap_or(events.len());
            let entries: Vec<SweepEntry> = stream::iter(events.into_iter().take(take))
                .map(|event| {
                    let cached = &cached;
                    async move {
                        let streams = cached.streams(&event.url).await;
                        SweepEntry { event, streams }
                    }
                })
                .buffered(workers)
                .collect()
                .await;
            info!(events = entries.len(), "Sweep complete");
            render(&entries, args.pretty)?
        }
    };
    println!("{json}");

    let elapsed = start_time.elapsed();
    info!(?elapsed, millis = elapsed.as_millis() as u64, "Execution complete");
    Ok(())
}

fn render<T: Serialize + ?Sized>(value: &T, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}
