//! # Stream Scout
//!
//! A content-discovery engine for live-event mirror sites. It picks a live
//! mirror, lists the events currently scheduled there, and extracts every
//! viewable stream reference from an event page.
//!
//! ## Architecture
//!
//! The engine is a pipeline:
//! 1. **Resolving**: probe the configured mirrors and pin the first live one
//! 2. **Listing**: scrape the mirror's front page for event links
//! 3. **Extracting**: run the ordered strategies (iframes, script variables,
//!    auxiliary API, URL patterns) over one event page
//! 4. **Filtering**: drop candidates that fail a HEAD probe, then dedupe by URL
//!
//! [`ScoutService`] runs engine calls on a bounded worker pool, and
//! [`CachedScout`] adds caller-side TTL memoization on top of it.
//!
//! ```no_run
//! use stream_scout::{CachedScout, Scout, ScoutConfig, ScoutService};
//!
//! # async fn demo() -> Result<(), stream_scout::ScoutError> {
//! let scout = Scout::new(ScoutConfig::default())?;
//! let cached = CachedScout::new(ScoutService::new(scout));
//! for event in cached.events().await {
//!     for stream in cached.streams(&event.url).await {
//!         println!("{}: {} ({:?})", event.title, stream.url, stream.kind);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod extract;
pub mod http;
pub mod listing;
pub mod models;
pub mod probe;
pub mod resolver;
pub mod scout;
pub mod service;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{CachedScout, TtlCache};
pub use config::ScoutConfig;
pub use error::ScoutError;
pub use models::{Event, Extraction, Listing, Origin, Outcome, StreamCandidate, StreamKind};
pub use scout::Scout;
pub use service::ScoutService;
