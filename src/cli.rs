//! Command-line interface definitions for Stream Scout.
//!
//! This module defines the CLI arguments and subcommands using the `clap`
//! crate. Results are printed to stdout as JSON; logs go to stderr.

use clap::{Parser, Subcommand};

/// Command-line arguments for the Stream Scout application.
///
/// # Examples
///
/// ```sh
/// # List current events
/// stream_scout events
///
/// # Extract streams for one event, with per-strategy outcomes
/// stream_scout streams https://gooool365.org/online/123-team-a-team-b.html --report
///
/// # Extract streams for the first five events
/// stream_scout -c scout.yaml sweep --limit 5
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long, env = "STREAM_SCOUT_CONFIG", global = true)]
    pub config: Option<String>,

    /// Pretty-print JSON output
    #[arg(short, long, global = true)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// List the events currently on the resolved mirror
    Events,

    /// Extract stream candidates from one event page
    Streams {
        /// Absolute URL of the event page
        url: String,

        /// Include per-strategy outcomes and the page headline
        #[arg(short, long)]
        report: bool,
    },

    /// List events, then extract streams for each through the worker pool
    Sweep {
        /// Only process the first N events
        #[arg(short, long)]
        limit: Option<usize>,
    },
}
