//! Strategy 4: player-shaped URLs anywhere in the raw markup.
//!
//! Each pattern contributes at most one candidate: the first match that is
//! neither excluded, dead, nor already tried by an earlier pattern. This keeps
//! the candidate count bounded on pages that link the same player dozens of
//! times.

use super::{EventPage, Harvest, Strategy};
use crate::error::Result;
use crate::models::{Origin, StreamCandidate};
use crate::utils::{LOG_URL_MAX, contains_any, truncate_for_log};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;
use url::Url;

static PLAYER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#"(?i)https?://[^\s'"<>]+\.php[^\s'"<>]*"#,
        r#"(?i)https?://[^\s'"<>]+/player[^\s'"<>]*"#,
        r#"(?i)https?://[^\s'"<>]+/embed/[^\s'"<>]*"#,
        r#"(?i)https?://[^\s'"<>]+/live/[^\s'"<>]*"#,
        r#"(?i)https?://[^\s'"<>]+/stream[^\s'"<>]*"#,
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Matches of every pattern, grouped per pattern in pattern order, with
/// excluded URLs already removed.
pub fn scan_players(markup: &str, exclusions: &[String]) -> Vec<Vec<String>> {
    PLAYER_PATTERNS
        .iter()
        .map(|re| {
            re.find_iter(markup)
                .map(|m| m.as_str())
                .filter(|url| !contains_any(url, exclusions))
                .map(str::to_string)
                .collect()
        })
        .collect()
}

/// True when `url` points at `host` or one of its subdomains.
fn on_host(url: &str, host: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
        .is_some_and(|h| h == host || h.ends_with(&format!(".{host}")))
}

#[derive(Debug, Clone, Copy)]
pub struct PatternMatch;

#[async_trait]
impl Strategy for PatternMatch {
    fn origin(&self) -> Origin {
        Origin::PatternMatch
    }

    async fn harvest(&self, page: &EventPage<'_>) -> Result<Harvest> {
        let markup = page.markup()?;
        let own_host = page.base.host_str();

        let mut found: Vec<StreamCandidate> = Vec::new();
        // A URL matching several patterns is probed and numbered once.
        let mut tried: HashSet<String> = HashSet::new();
        for matches in scan_players(markup, &page.config.pattern_exclusions) {
            for url in matches {
                if own_host.is_some_and(|host| on_host(&url, host)) {
                    continue;
                }
                if !tried.insert(url.clone()) {
                    continue;
                }
                if page.passes(&url).await {
                    debug!(url = %truncate_for_log(&url, LOG_URL_MAX), "Pattern hit");
                    let title = format!("Player {}", found.len() + 1);
                    found.push(StreamCandidate::new(title, url, Origin::PatternMatch));
                    break;
                }
            }
        }
        Ok(Harvest::Found(found))
    }
}
