//! Small helpers shared by the extractors: log truncation, URL resolution and
//! token screening.

use url::Url;

/// Byte budget for URLs echoed into log fields.
pub const LOG_URL_MAX: usize = 100;

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` bytes (backing off to a char boundary) with
/// an ellipsis and byte count appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Resolve a raw `src`/`href` value against `base`.
///
/// Handles protocol-relative (`//host/x`), root-relative (`/x`) and plain
/// relative references. Returns `None` for empty values and anything that
/// does not end up as http(s).
pub fn resolve_against(base: &Url, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let resolved = base.join(raw).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}

/// Case-insensitive "contains any of these tokens".
pub fn contains_any(haystack: &str, tokens: &[String]) -> bool {
    let lower = haystack.to_lowercase();
    tokens
        .iter()
        .any(|t| !t.is_empty() && lower.contains(&t.to_lowercase()))
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn squash_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://mirror.example").unwrap()
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_multibyte() {
        // "Трансляция" is two bytes per char; byte 3 is mid-char.
        let result = truncate_for_log("Трансляция", 3);
        assert!(result.starts_with("Т…"));
    }

    #[test]
    fn test_resolve_against() {
        assert_eq!(
            resolve_against(&base(), "//cdn.example/embed/1").as_deref(),
            Some("https://cdn.example/embed/1")
        );
        assert_eq!(
            resolve_against(&base(), "/frame/2").as_deref(),
            Some("https://mirror.example/frame/2")
        );
        assert_eq!(
            resolve_against(&base(), "https://other.example/x").as_deref(),
            Some("https://other.example/x")
        );
        assert_eq!(resolve_against(&base(), "  "), None);
        assert_eq!(resolve_against(&base(), "javascript:void(0)"), None);
    }

    #[test]
    fn test_contains_any() {
        let tokens = vec!["vk.com".to_string(), "Analytics".to_string()];
        assert!(contains_any("https://VK.com/widget", &tokens));
        assert!(contains_any("https://x.example/analytics.js", &tokens));
        assert!(!contains_any("https://cdn.example/watch/42", &tokens));
        assert!(!contains_any("anything", &[String::new()]));
    }

    #[test]
    fn test_squash_whitespace() {
        assert_eq!(squash_whitespace("  Team A \n  vs\tTeam B "), "Team A vs Team B");
    }
}
