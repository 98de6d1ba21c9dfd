//! Strategy 1: inline frames embedded in the event page.

use super::{EventPage, Harvest, Strategy};
use crate::error::Result;
use crate::models::{Origin, StreamCandidate};
use crate::utils::{LOG_URL_MAX, contains_any, resolve_against, truncate_for_log};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use url::Url;

static IFRAME_SRC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)<iframe[^>]+src=["']([^"']+)["'][^>]*>"#).unwrap());

/// Raw `src` values of every `<iframe>` in `markup`, in document order.
pub fn scan_iframes(markup: &str) -> Vec<&str> {
    IFRAME_SRC
        .captures_iter(markup)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .collect()
}

/// Title and resolved URL for each iframe source.
///
/// Titles are `"<label> N"` where `N` is the 1-based position among all
/// iframes, denylisted ones included. Sources containing a denylisted token
/// or that cannot be resolved to http(s) are dropped.
pub(crate) fn titled_iframes(
    markup: &str,
    base: &Url,
    denylist: &[String],
    label: &str,
) -> Vec<(String, String)> {
    scan_iframes(markup)
        .into_iter()
        .enumerate()
        .filter_map(|(i, src)| {
            if contains_any(src, denylist) {
                debug!(src = %truncate_for_log(src, LOG_URL_MAX), "Skipping denylisted iframe");
                return None;
            }
            let url = resolve_against(base, src)?;
            Some((format!("{} {}", label, i + 1), url))
        })
        .collect()
}

/// Iframe scan over the event page markup.
#[derive(Debug, Clone, Copy)]
pub struct IframeScan;

#[async_trait]
impl Strategy for IframeScan {
    fn origin(&self) -> Origin {
        Origin::Iframe
    }

    async fn harvest(&self, page: &EventPage<'_>) -> Result<Harvest> {
        let markup = page.markup()?;
        let pairs = titled_iframes(markup, page.base, &page.config.iframe_denylist, "Stream");
        let kept = page.keep_reachable(pairs).await;
        Ok(Harvest::Found(
            kept.into_iter()
                .map(|(title, url)| StreamCandidate::new(title, url, Origin::Iframe))
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoutConfig;
    use crate::http::Verb;
    use crate::testing::FakeTransport;

    const MARKUP: &str = r#"
<div class="player">
  <IFRAME width="100%" SRC="https://www.google.com/maps/embed"></IFRAME>
  <iframe src='//cdn.example/watch/42' allowfullscreen></iframe>
  <iframe frameborder="0" src="/frame/7"></iframe>
  <iframe src="https://vk.com/video_ext.php?oid=1"></iframe>
  <iframe src="https://dead.example/embed/1"></iframe>
</div>
"#;

    fn base() -> Url {
        Url::parse("https://mirror.example").unwrap()
    }

    #[test]
    fn test_scan_iframes() {
        let srcs = scan_iframes(MARKUP);
        assert_eq!(srcs.len(), 5);
        assert_eq!(srcs[1], "//cdn.example/watch/42");
        assert_eq!(srcs[2], "/frame/7");
    }

    #[test]
    fn test_titled_iframes_filters_and_numbers() {
        let denylist = ScoutConfig::default().iframe_denylist;
        let pairs = titled_iframes(MARKUP, &base(), &denylist, "Stream");
        assert_eq!(
            pairs,
            vec![
                ("Stream 2".to_string(), "https://cdn.example/watch/42".to_string()),
                ("Stream 3".to_string(), "https://mirror.example/frame/7".to_string()),
                ("Stream 5".to_string(), "https://dead.example/embed/1".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_harvest_keeps_reachable_only() {
        let fake = FakeTransport::new()
            .reachable("https://cdn.example/watch/42")
            .reachable("https://mirror.example/frame/7")
            .respond(Verb::Head, "https://dead.example/embed/1", 404, "");
        let config = ScoutConfig::default();
        let base = base();
        let page = EventPage {
            event_url: "https://mirror.example/online/1-x.html",
            base: &base,
            markup: Ok(MARKUP),
            transport: &fake,
            config: &config,
        };

        let Harvest::Found(found) = IframeScan.harvest(&page).await.unwrap() else {
            panic!("iframe scan never skips");
        };
        let urls: Vec<&str> = found.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(urls, vec!["https://cdn.example/watch/42", "https://mirror.example/frame/7"]);
        assert!(found.iter().all(|c| c.origin == Origin::Iframe));
    }

    #[tokio::test]
    async fn test_harvest_without_page_fails() {
        let fake = FakeTransport::new();
        let config = ScoutConfig::default();
        let base = base();
        let page = EventPage {
            event_url: "https://mirror.example/online/1-x.html",
            base: &base,
            markup: Err("HTTP 502"),
            transport: &fake,
            config: &config,
        };
        assert!(IframeScan.harvest(&page).await.is_err());
    }
}
