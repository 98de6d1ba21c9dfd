//! Link extractor: find every stream reference on one event page.
//!
//! The extractor is a fixed, ordered pipeline of independent strategies that
//! all return [`StreamCandidate`]s:
//!
//! | Order | Strategy | Module | Source |
//! |-------|----------|--------|--------|
//! | 1 | Iframe scan | [`iframe`] | `<iframe src>` in page markup |
//! | 2 | Script variables | [`script`] | `videoidN = '...src="..."...'` assignments |
//! | 3 | Auxiliary API | [`aux_api`] | POST to the mirror's `/player/` endpoint |
//! | 4 | Pattern match | [`pattern`] | player-shaped URLs anywhere in markup |
//!
//! Strategies run strictly one after another. The merge keeps the first
//! occurrence of each URL, so execution order is also dedup precedence.
//!
//! A failing strategy never aborts the run: its error is recorded as an
//! [`Outcome::Failed`] report and it contributes nothing.

pub mod aux_api;
pub mod iframe;
pub mod pattern;
pub mod script;

use crate::config::ScoutConfig;
use crate::error::{Result, ScoutError};
use crate::http::Transport;
use crate::models::{Origin, Outcome, StrategyReport, StreamCandidate};
use crate::probe::is_reachable;
use crate::utils::{LOG_URL_MAX, squash_whitespace, truncate_for_log};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Everything a strategy may look at for one event.
pub struct EventPage<'a> {
    pub event_url: &'a str,
    /// Resolved mirror; relative references are resolved against it.
    pub base: &'a Url,
    /// Raw page markup, or the reason it could not be fetched.
    pub markup: std::result::Result<&'a str, &'a str>,
    pub transport: &'a dyn Transport,
    pub config: &'a ScoutConfig,
}

impl<'a> EventPage<'a> {
    /// Page markup, or [`ScoutError::PageUnavailable`].
    pub fn markup(&self) -> Result<&'a str> {
        self.markup
            .map_err(|reason| ScoutError::PageUnavailable(reason.to_string()))
    }

    /// Keep the `(title, url)` pairs whose URL passes the reachability probe.
    ///
    /// Probes run concurrently but results keep their input order. With
    /// `verify_links` off everything passes.
    pub async fn keep_reachable(&self, pairs: Vec<(String, String)>) -> Vec<(String, String)> {
        if !self.config.verify_links {
            return pairs;
        }
        let timeout = self.config.probe_timeout();
        stream::iter(pairs)
            .map(|(title, url)| async move {
                let ok = is_reachable(self.transport, &url, timeout).await;
                if !ok {
                    debug!(url = %truncate_for_log(&url, LOG_URL_MAX), "Dropping unreachable candidate");
                }
                (title, url, ok)
            })
            .buffered(self.config.probe_concurrency)
            .filter_map(|(title, url, ok)| std::future::ready(ok.then_some((title, url))))
            .collect()
            .await
    }

    /// Single-link variant of [`EventPage::keep_reachable`].
    pub async fn passes(&self, url: &str) -> bool {
        !self.config.verify_links
            || is_reachable(self.transport, url, self.config.probe_timeout()).await
    }
}

/// What a strategy produced when it did not error.
#[derive(Debug)]
pub enum Harvest {
    Found(Vec<StreamCandidate>),
    /// Precondition missing; the strategy did not run.
    Skipped(String),
}

/// One named extraction strategy.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Origin this strategy reports under.
    fn origin(&self) -> Origin;

    async fn harvest(&self, page: &EventPage<'_>) -> Result<Harvest>;
}

/// The ordered strategy pipeline plus the merge step.
pub struct LinkExtractor {
    strategies: Vec<Box<dyn Strategy>>,
}

impl Default for LinkExtractor {
    fn default() -> Self {
        Self::with_strategies(vec![
            Box::new(iframe::IframeScan),
            Box::new(script::ScriptVariables),
            Box::new(aux_api::AuxApi),
            Box::new(pattern::PatternMatch),
        ])
    }
}

impl LinkExtractor {
    pub fn with_strategies(strategies: Vec<Box<dyn Strategy>>) -> Self {
        Self { strategies }
    }

    /// Run every strategy in order, then merge.
    #[instrument(level = "info", skip_all, fields(event_url = %page.event_url))]
    pub async fn run(&self, page: &EventPage<'_>) -> (Vec<StreamCandidate>, Vec<StrategyReport>) {
        let mut collected = Vec::new();
        let mut reports = Vec::with_capacity(self.strategies.len());

        for strategy in &self.strategies {
            let origin = strategy.origin();
            let outcome = match strategy.harvest(page).await {
                Ok(Harvest::Found(found)) => {
                    let outcome = Outcome::from_count(found.len());
                    collected.extend(found);
                    outcome
                }
                Ok(Harvest::Skipped(reason)) => {
                    debug!(strategy = %origin, %reason, "Strategy skipped");
                    Outcome::Skipped(reason)
                }
                Err(e) => {
                    warn!(strategy = %origin, error = %e, "Strategy failed; continuing");
                    Outcome::Failed(e.to_string())
                }
            };
            info!(strategy = %origin, ?outcome, "Strategy finished");
            reports.push(StrategyReport {
                strategy: origin,
                outcome,
            });
        }

        let merged = merge(collected);
        info!(count = merged.len(), "Merged stream candidates");
        (merged, reports)
    }
}

/// Deduplicate by exact URL, keeping the first occurrence and order.
pub fn merge(candidates: Vec<StreamCandidate>) -> Vec<StreamCandidate> {
    candidates
        .into_iter()
        .filter(|c| !c.url.is_empty())
        .unique_by(|c| c.url.clone())
        .collect()
}

static HEADLINE: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());
static DOC_TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());

/// Headline of an event page: first `h1`, else the document `title`.
pub fn page_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    document
        .select(&HEADLINE)
        .chain(document.select(&DOC_TITLE))
        .map(|el| squash_whitespace(&el.text().collect::<String>()))
        .find(|t| !t.is_empty())
}
