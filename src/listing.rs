//! Listing extractor: turn the mirror's front page into a list of events.
//!
//! # URL Pattern
//!
//! Event pages live under `/online/<id>`; only the direct-broadcast subset,
//! `/online/<id>-<slug>`, is kept, since the looser shape also matches
//! non-broadcast pages on the live site.

use crate::error::Result;
use crate::http::{HttpRequest, Transport};
use crate::models::{Event, Outcome};
use crate::utils::{resolve_against, squash_whitespace};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

static EVENT_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"/online/\d+").unwrap());
static BROADCAST_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"/online/\d+-").unwrap());
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static LABELLED: Lazy<Selector> = Lazy::new(|| Selector::parse("[title], [alt]").unwrap());

/// Extract events from listing markup, in document order, unique by URL.
pub fn parse_listing(html: &str, base: &Url) -> Vec<Event> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut events = Vec::new();

    for anchor in document.select(&ANCHOR) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !EVENT_PATH.is_match(href) {
            continue;
        }
        let Some(url) = resolve_against(base, href) else {
            continue;
        };
        if !BROADCAST_PATH.is_match(&url) {
            continue;
        }
        let title = anchor_title(anchor);
        if title.is_empty() || seen.contains(&url) {
            continue;
        }
        debug!(%title, %url, "Found event");
        seen.insert(url.clone());
        events.push(Event { title, url });
    }
    events
}

/// Visible text of the anchor, all descendant text nodes concatenated and
/// whitespace squashed; falls back to `title`/`alt` attributes for
/// image-only anchors.
fn anchor_title(anchor: ElementRef<'_>) -> String {
    let visible = squash_whitespace(&anchor.text().collect::<String>());
    if !visible.is_empty() {
        return visible;
    }

    std::iter::once(anchor)
        .chain(anchor.select(&LABELLED))
        .filter_map(|el| el.value().attr("title").or_else(|| el.value().attr("alt")))
        .map(squash_whitespace)
        .find(|t| !t.is_empty())
        .unwrap_or_default()
}

/// Fetch the front page of `base` and parse it.
///
/// # Arguments
///
/// * `transport` - Transport used for the GET
/// * `base` - Resolved mirror whose front page lists the events
/// * `timeout` - Fetch timeout
///
/// # Returns
///
/// The events in document order, with the [`Outcome`] of the fetch. Never
/// fails: a network or status error yields no events and an
/// [`Outcome::Failed`] describing why.
#[instrument(level = "info", skip(transport, base), fields(base = %base))]
pub async fn fetch_listing(
    transport: &dyn Transport,
    base: &Url,
    timeout: Duration,
) -> (Vec<Event>, Outcome) {
    match fetch_markup(transport, base, timeout).await {
        Ok(html) => {
            let events = parse_listing(&html, base);
            info!(count = events.len(), "Indexed events");
            let outcome = Outcome::from_count(events.len());
            (events, outcome)
        }
        Err(e) => {
            warn!(error = %e, "Listing fetch failed");
            (Vec::new(), Outcome::Failed(e.to_string()))
        }
    }
}

async fn fetch_markup(transport: &dyn Transport, base: &Url, timeout: Duration) -> Result<String> {
    transport
        .send(HttpRequest::get(base.as_str(), timeout))
        .await?
        .into_text(base.as_str())
}
