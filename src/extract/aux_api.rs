//! Strategy 3: the mirror's auxiliary `/player/` endpoint.
//!
//! The event's numeric id is taken from its URL (`/online/<id>-...`) and
//! posted as `newsid=<id>`, with the event page as referer and an
//! `X-Requested-With: XMLHttpRequest` header. The response is scanned for:
//!
//! 1. anchors pointing at the peer-stream scheme (titled by anchor text);
//! 2. failing that, bare `acestream://<40 hex>` ids;
//! 3. additionally, inline frames, titled "Extra channel N".
//!
//! Without an id the strategy is skipped. Any failure is contained here.

use super::iframe::titled_iframes;
use super::{EventPage, Harvest, Strategy};
use crate::error::{Result, ScoutError};
use crate::http::HttpRequest;
use crate::models::{Origin, PEER_SCHEME, StreamCandidate};
use crate::utils::squash_whitespace;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, info};

static EVENT_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"/online/(\d+)-").unwrap());
static PEER_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("{}([a-f0-9]{{40}})", regex::escape(PEER_SCHEME))).unwrap()
});
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// Numeric event id carried by an event URL, if any.
pub fn event_id(event_url: &str) -> Option<&str> {
    EVENT_ID
        .captures(event_url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Peer-stream candidates in an auxiliary response body.
///
/// Anchors win; bare ids are only used when the body has no such anchor.
pub fn parse_peer_links(body: &str) -> Vec<StreamCandidate> {
    let anchors: Vec<(String, String)> = {
        let document = Html::parse_fragment(body);
        document
            .select(&ANCHOR)
            .filter_map(|a| {
                let href = a.value().attr("href")?.trim();
                href.starts_with(PEER_SCHEME).then(|| {
                    (
                        squash_whitespace(&a.text().collect::<String>()),
                        href.to_string(),
                    )
                })
            })
            .collect()
    };

    if !anchors.is_empty() {
        return anchors
            .into_iter()
            .enumerate()
            .map(|(i, (text, href))| {
                let title = if text.is_empty() {
                    format!("Peer stream {}", i + 1)
                } else {
                    text
                };
                StreamCandidate::new(title, href, Origin::AuxApi)
            })
            .collect();
    }

    PEER_ID
        .captures_iter(body)
        .filter_map(|c| c.get(1))
        .enumerate()
        .map(|(i, id)| {
            StreamCandidate::new(
                format!("Peer stream {}", i + 1),
                format!("{}{}", PEER_SCHEME, id.as_str()),
                Origin::AuxApi,
            )
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
pub struct AuxApi;

impl AuxApi {
    async fn fetch(&self, page: &EventPage<'_>, id: &str) -> Result<String> {
        let endpoint = page
            .base
            .join("/player/")
            .map_err(|source| ScoutError::Url {
                url: page.base.to_string(),
                source,
            })?;
        let request = HttpRequest::post(endpoint.as_str(), page.config.fetch_timeout())
            .header("Referer", page.event_url)
            .header("X-Requested-With", "XMLHttpRequest")
            .field("newsid", id);
        page.transport
            .send(request)
            .await?
            .into_text(endpoint.as_str())
    }
}

#[async_trait]
impl Strategy for AuxApi {
    fn origin(&self) -> Origin {
        Origin::AuxApi
    }

    async fn harvest(&self, page: &EventPage<'_>) -> Result<Harvest> {
        let Some(id) = event_id(page.event_url) else {
            return Ok(Harvest::Skipped("event url carries no numeric id".to_string()));
        };
        debug!(id, "Querying auxiliary endpoint");
        let body = self.fetch(page, id).await?;

        let mut found = parse_peer_links(&body);
        info!(count = found.len(), "Peer streams from auxiliary endpoint");

        // The endpoint sometimes embeds frames instead of peer links; those are
        // not screened by the page denylist.
        let frames = titled_iframes(&body, page.base, &[], "Extra channel");
        let kept = page.keep_reachable(frames).await;
        found.extend(
            kept.into_iter()
                .map(|(title, url)| StreamCandidate::new(title, url, Origin::AuxApiIframe)),
        );
        Ok(Harvest::Found(found))
    }
}
