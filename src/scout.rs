//! The discovery engine.
//!
//! A [`Scout`] owns its transport, its configuration and the base URL it
//! resolved on first use. The mirror is resolved once per instance and then
//! reused; a mirror that dies mid-session stays pinned until a new instance
//! is built.

use crate::config::ScoutConfig;
use crate::error::Result;
use crate::extract::{EventPage, LinkExtractor, page_title};
use crate::http::{HttpRequest, Transport, default_transport};
use crate::listing::fetch_listing;
use crate::models::{Event, Extraction, Listing, StreamCandidate};
use crate::resolver::resolve_mirror;
use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, instrument, warn};
use url::Url;

pub struct Scout {
    transport: Arc<dyn Transport>,
    config: ScoutConfig,
    mirrors: Vec<Url>,
    base_url: OnceCell<Url>,
    extractor: LinkExtractor,
}

impl fmt::Debug for Scout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scout")
            .field("mirrors", &self.mirrors)
            .field("base_url", &self.base_url.get())
            .finish()
    }
}

impl Scout {
    /// Engine over the production HTTP stack.
    pub fn new(config: ScoutConfig) -> Result<Self> {
        let transport = default_transport(&config)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Engine over any transport; validates the config.
    pub fn with_transport(config: ScoutConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        let mirrors = config.mirror_urls()?;
        Ok(Self {
            transport,
            config,
            mirrors,
            base_url: OnceCell::new(),
            extractor: LinkExtractor::default(),
        })
    }

    pub fn config(&self) -> &ScoutConfig {
        &self.config
    }

    /// Mirror in use, resolving it on first call.
    pub async fn base_url(&self) -> &Url {
        self.base_url
            .get_or_init(|| async {
                resolve_mirror(
                    self.transport.as_ref(),
                    &self.mirrors,
                    self.config.probe_timeout(),
                    self.config.mirror_probe_delay(),
                )
                .await
            })
            .await
    }

    /// Current events, unique by URL. Empty when nothing is scheduled or the
    /// fetch failed; see [`Scout::listing`] to tell the two apart.
    pub async fn list_events(&self) -> Vec<Event> {
        self.listing().await.events
    }

    #[instrument(level = "info", skip(self))]
    pub async fn listing(&self) -> Listing {
        let base = self.base_url().await.clone();
        let (events, outcome) =
            fetch_listing(self.transport.as_ref(), &base, self.config.fetch_timeout()).await;
        Listing {
            base_url: base.to_string(),
            events,
            outcome,
            fetched_at: Utc::now(),
        }
    }

    /// Deduplicated stream candidates for one event page.
    pub async fn extract_streams(&self, event_url: &str) -> Vec<StreamCandidate> {
        self.extraction(event_url).await.candidates
    }

    /// Full extraction run with per-strategy reports.
    ///
    /// Fetches the event page, then runs every strategy in order against it.
    /// A page that cannot be fetched still lets the auxiliary API run.
    ///
    /// # Arguments
    ///
    /// * `event_url` - Absolute URL of the event page
    ///
    /// # Returns
    ///
    /// An [`Extraction`] holding the deduplicated candidates, the page
    /// headline if any, and one
    /// [`StrategyReport`](crate::models::StrategyReport) per strategy.
    #[instrument(level = "info", skip(self))]
    pub async fn extraction(&self, event_url: &str) -> Extraction {
        let base = self.base_url().await.clone();

        let markup = self.fetch_page(event_url).await.map_err(|e| {
            warn!(error = %e, "Event page fetch failed");
            e.to_string()
        });
        let page_title = markup.as_deref().ok().and_then(page_title);

        let page = EventPage {
            event_url,
            base: &base,
            markup: markup.as_deref().map_err(String::as_str),
            transport: self.transport.as_ref(),
            config: &self.config,
        };
        let (candidates, reports) = self.extractor.run(&page).await;
        info!(count = candidates.len(), "Extraction complete");

        Extraction {
            event_url: event_url.to_string(),
            page_title,
            candidates,
            reports,
            extracted_at: Utc::now(),
        }
    }

    async fn fetch_page(&self, event_url: &str) -> Result<String> {
        self.transport
            .send(HttpRequest::get(event_url, self.config.fetch_timeout()))
            .await?
            .into_text(event_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Verb;
    use crate::models::{Origin, Outcome, StreamKind};
    use crate::testing::FakeTransport;

    const HASH: &str = "0123456789abcdef0123456789abcdef01234567";

    fn config() -> ScoutConfig {
        ScoutConfig {
            mirrors: vec![
                "https://a.example".to_string(),
                "https://b.example".to_string(),
            ],
            mirror_probe_delay_ms: 0,
            ..ScoutConfig::default()
        }
    }

    fn scout(fake: &FakeTransport) -> Scout {
        Scout::with_transport(config(), Arc::new(fake.clone())).unwrap()
    }

    #[tokio::test]
    async fn test_base_url_resolved_once() {
        let fake = FakeTransport::new().reachable("https://b.example/");
        let scout = scout(&fake);
        assert_eq!(scout.base_url().await.as_str(), "https://b.example/");
        assert_eq!(scout.base_url().await.as_str(), "https://b.example/");
        assert_eq!(fake.calls(Verb::Head, "https://a.example/"), 1);
        assert_eq!(fake.calls(Verb::Head, "https://b.example/"), 1);
    }

    #[tokio::test]
    async fn test_dead_mirrors_fall_back_to_first() {
        let fake = FakeTransport::new();
        let scout = scout(&fake);
        let listing = scout.listing().await;
        assert_eq!(listing.base_url, "https://a.example/");
        assert!(listing.events.is_empty());
        assert!(listing.outcome.is_failed());
    }

    #[tokio::test]
    async fn test_listing_unique_events() {
        let page = r#"
            <a href="/online/1-a-b.html">A vs B</a>
            <a href="/online/1-a-b.html">A vs B</a>
            <a href="/online/2-c-d.html">C vs D</a>"#;
        let fake = FakeTransport::new()
            .reachable("https://a.example/")
            .respond(Verb::Get, "https://a.example/", 200, page);
        let events = scout(&fake).list_events().await;
        assert_eq!(
            events,
            vec![
                Event {
                    title: "A vs B".into(),
                    url: "https://a.example/online/1-a-b.html".into()
                },
                Event {
                    title: "C vs D".into(),
                    url: "https://a.example/online/2-c-d.html".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_iframe_and_player_scenario() {
        let event_url = "https://a.example/match/final";
        let page = r#"
            <h1>Final</h1>
            <iframe src="https://cdn.example/watch/42"></iframe>
            <a href="https://cdn.example/player/9">Backup</a>"#;
        let fake = FakeTransport::new()
            .reachable("https://a.example/")
            .respond(Verb::Get, event_url, 200, page)
            .reachable("https://cdn.example/watch/42")
            .reachable("https://cdn.example/player/9");

        let extraction = scout(&fake).extraction(event_url).await;
        let got: Vec<(&str, &str, StreamKind)> = extraction
            .candidates
            .iter()
            .map(|c| (c.title.as_str(), c.url.as_str(), c.kind))
            .collect();
        assert_eq!(
            got,
            vec![
                ("Stream 1", "https://cdn.example/watch/42", StreamKind::Web),
                ("Player 1", "https://cdn.example/player/9", StreamKind::Web),
            ]
        );
        assert_eq!(extraction.page_title.as_deref(), Some("Final"));
        assert!(matches!(extraction.reports[2].outcome, Outcome::Skipped(_)));
        // No numeric id, so the auxiliary endpoint is never called.
        assert_eq!(fake.calls(Verb::Post, "https://a.example/player/"), 0);
    }

    #[tokio::test]
    async fn test_strategy_order_and_dedup() {
        let event_url = "https://a.example/online/55-a-b.html";
        let page = r#"
            <iframe src="https://cdn.example/embed/1"></iframe>
            <script>var videoid1 = '<iframe src="https://cdn.example/embed/1"></iframe>';
                    var videoid2 = '<iframe src=\"https://cdn.example/embed/2\"></iframe>';</script>"#;
        let aux = format!(
            r#"<a href="acestream://{HASH}">Main</a><iframe src="https://cdn.example/embed/2"></iframe>"#
        );
        let fake = FakeTransport::new()
            .reachable("https://a.example/")
            .respond(Verb::Get, event_url, 200, page)
            .respond(Verb::Post, "https://a.example/player/", 200, &aux)
            .reachable("https://cdn.example/embed/1")
            .reachable("https://cdn.example/embed/2");

        let extraction = scout(&fake).extraction(event_url).await;
        let got: Vec<(&str, Origin)> = extraction
            .candidates
            .iter()
            .map(|c| (c.title.as_str(), c.origin))
            .collect();
        // embed/1 is hit by the iframe, script and pattern scans; the escaped
        // embed/2 only by the script scan and the aux iframe. Earlier wins.
        assert_eq!(
            got,
            vec![
                ("Stream 1", Origin::Iframe),
                ("Channel 2", Origin::ScriptVariable),
                ("Main", Origin::AuxApi),
            ]
        );
        assert_eq!(extraction.candidates[2].kind, StreamKind::PeerStream);
        assert!(!extraction.degraded());
    }

    #[tokio::test]
    async fn test_aux_failure_keeps_other_strategies() {
        let event_url = "https://a.example/online/56-a-b.html";
        let page = r#"<iframe src="https://cdn.example/watch/1"></iframe>
                      <a href="https://cdn.example/live/2">live</a>"#;
        let fake = FakeTransport::new()
            .reachable("https://a.example/")
            .respond(Verb::Get, event_url, 200, page)
            .fail(Verb::Post, "https://a.example/player/")
            .reachable("https://cdn.example/watch/1")
            .reachable("https://cdn.example/live/2");

        let extraction = scout(&fake).extraction(event_url).await;
        let urls: Vec<&str> = extraction.candidates.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(urls, vec!["https://cdn.example/watch/1", "https://cdn.example/live/2"]);
        assert!(extraction.reports[2].outcome.is_failed());
        assert!(extraction.degraded());
    }

    #[tokio::test]
    async fn test_dead_event_page_still_queries_aux() {
        let event_url = "https://a.example/online/57-a-b.html";
        let aux = format!("acestream://{HASH}");
        let fake = FakeTransport::new()
            .reachable("https://a.example/")
            .respond(Verb::Get, event_url, 404, "")
            .respond(Verb::Post, "https://a.example/player/", 200, &aux);

        let extraction = scout(&fake).extraction(event_url).await;
        assert_eq!(extraction.candidates.len(), 1);
        assert_eq!(extraction.candidates[0].title, "Peer stream 1");
        assert_eq!(extraction.page_title, None);
        let failed: Vec<Origin> = extraction
            .reports
            .iter()
            .filter(|r| r.outcome.is_failed())
            .map(|r| r.strategy)
            .collect();
        assert_eq!(failed, vec![Origin::Iframe, Origin::ScriptVariable, Origin::PatternMatch]);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ScoutConfig {
            mirrors: vec![],
            ..ScoutConfig::default()
        };
        assert!(Scout::with_transport(config, Arc::new(FakeTransport::new())).is_err());
    }
}
