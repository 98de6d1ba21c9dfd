//! Strategy 2: players declared in inline script variables.
//!
//! The site stores player markup in string assignments such as
//!
//! ```text
//! videoid1 = '<iframe src="https://cdn.example/embed/9" allowfullscreen></iframe>';
//! ```
//!
//! The nested `src` is pulled out of the string body. Escaped quotes
//! (`src=\"...\"`) are accepted.

use super::{EventPage, Harvest, Strategy};
use crate::error::Result;
use crate::models::{Origin, StreamCandidate};
use crate::utils::resolve_against;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static VIDEO_VAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"videoid\d+\s*=\s*(?:'([^']*)'|"([^"]*)")"#).unwrap());
static NESTED_SRC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"src\s*=\s*\\?["']([^"'\\]+)"#).unwrap());

/// String bodies of every `videoidN = '...'` assignment, in order.
pub fn scan_video_vars(markup: &str) -> Vec<&str> {
    VIDEO_VAR
        .captures_iter(markup)
        .filter_map(|c| c.get(1).or_else(|| c.get(2)))
        .map(|m| m.as_str())
        .collect()
}

/// `("Channel N", url)` for each assignment carrying a nested source; `N` is
/// the 1-based position among all assignments.
pub(crate) fn titled_channels(markup: &str, base: &Url) -> Vec<(String, String)> {
    scan_video_vars(markup)
        .into_iter()
        .enumerate()
        .filter_map(|(i, body)| {
            let src = NESTED_SRC.captures(body)?.get(1)?.as_str();
            let url = resolve_against(base, src)?;
            Some((format!("Channel {}", i + 1), url))
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
pub struct ScriptVariables;

#[async_trait]
impl Strategy for ScriptVariables {
    fn origin(&self) -> Origin {
        Origin::ScriptVariable
    }

    async fn harvest(&self, page: &EventPage<'_>) -> Result<Harvest> {
        let markup = page.markup()?;
        let pairs = titled_channels(markup, page.base);
        let kept = page.keep_reachable(pairs).await;
        Ok(Harvest::Found(
            kept.into_iter()
                .map(|(title, url)| StreamCandidate::new(title, url, Origin::ScriptVariable))
                .collect(),
        ))
    }
}
