//! Data models produced by the discovery engine.
//!
//! This module defines the two entities handed to collaborators plus the
//! diagnostic types that describe how they were obtained:
//! - [`Event`]: one live broadcast listing (title + page URL)
//! - [`StreamCandidate`]: one viewable resource found on an event page
//! - [`StrategyReport`] / [`Outcome`]: per-strategy result, so an empty list
//!   can be told apart from a failed extraction
//! - [`Listing`] / [`Extraction`]: detailed wrappers around the two sequences
//!
//! Everything here is ephemeral and recomputed on each cache miss.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// URI scheme prefix of peer-to-peer stream references.
pub const PEER_SCHEME: &str = "acestream://";

/// A discoverable live broadcast.
///
/// Identity is `url`; the listing never yields two events with the same one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Human-readable title taken from the listing anchor.
    pub title: String,
    /// Absolute URL of the event page.
    pub url: String,
}

/// How a candidate is meant to be opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    /// Conventional web URL (player page, embed, HLS endpoint...).
    Web,
    /// Peer-to-peer stream reference ([`PEER_SCHEME`]).
    PeerStream,
}

impl StreamKind {
    /// Derive the kind from the URL scheme prefix alone.
    pub fn of(url: &str) -> Self {
        if url.starts_with(PEER_SCHEME) {
            StreamKind::PeerStream
        } else {
            StreamKind::Web
        }
    }
}

/// Which extraction strategy produced a candidate. Diagnostic only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Iframe,
    ScriptVariable,
    AuxApi,
    AuxApiIframe,
    PatternMatch,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Origin::Iframe => "iframe",
            Origin::ScriptVariable => "script_variable",
            Origin::AuxApi => "aux_api",
            Origin::AuxApiIframe => "aux_api_iframe",
            Origin::PatternMatch => "pattern_match",
        };
        f.write_str(name)
    }
}

/// One viewable resource associated with an [`Event`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamCandidate {
    pub title: String,
    pub url: String,
    pub kind: StreamKind,
    pub origin: Origin,
}

impl StreamCandidate {
    /// Build a candidate; `kind` is always derived from `url`.
    pub fn new(title: impl Into<String>, url: impl Into<String>, origin: Origin) -> Self {
        let url = url.into();
        Self {
            title: title.into(),
            kind: StreamKind::of(&url),
            url,
            origin,
        }
    }
}

/// Result of one listing fetch or one extraction strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Outcome {
    /// The step ran and yielded this many items.
    Found(usize),
    /// The step ran cleanly and found nothing.
    Empty,
    /// A precondition was missing, so the step never ran.
    Skipped(String),
    /// The step hit an error and contributed nothing.
    Failed(String),
}

impl Outcome {
    pub fn from_count(count: usize) -> Self {
        if count == 0 {
            Outcome::Empty
        } else {
            Outcome::Found(count)
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

/// Outcome of one strategy inside an extraction run.
///
/// `origin` names the strategy by its primary origin; the auxiliary API
/// strategy reports under [`Origin::AuxApi`] even when it also yields
/// [`Origin::AuxApiIframe`] candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyReport {
    pub strategy: Origin,
    pub outcome: Outcome,
}

/// Detailed result of a listing fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub base_url: String,
    pub events: Vec<Event>,
    pub outcome: Outcome,
    pub fetched_at: DateTime<Utc>,
}

/// Detailed result of one extraction run over an event page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Extraction {
    pub event_url: String,
    /// Headline of the event page, when the page could be fetched.
    pub page_title: Option<String>,
    /// Deduplicated candidates in strategy order.
    pub candidates: Vec<StreamCandidate>,
    /// One report per strategy, in execution order.
    pub reports: Vec<StrategyReport>,
    pub extracted_at: DateTime<Utc>,
}

impl Extraction {
    /// True when at least one strategy errored rather than finding nothing.
    pub fn degraded(&self) -> bool {
        self.reports.iter().any(|r| r.outcome.is_failed())
    }
}
