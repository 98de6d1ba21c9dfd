//! Domain resolver: pick one live mirror out of the configured list.
//!
//! Mirrors are probed in order with a HEAD request; the first one answering
//! with a success status wins. When every probe fails the first mirror is
//! returned anyway, pushing the failure signal down to the first real fetch.
//! A short pause separates consecutive probes to stay clear of basic rate
//! limiting.

use crate::http::{HttpRequest, Transport};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, instrument, warn};
use url::Url;

/// Probe `mirrors` in order and return the first live one.
///
/// # Arguments
///
/// * `transport` - Transport used for the HEAD probes
/// * `mirrors` - Candidate base URLs in preference order; must be non-empty,
///   which [`ScoutConfig::validate`](crate::config::ScoutConfig::validate) guarantees
/// * `timeout` - Per-probe timeout
/// * `probe_delay` - Pause between consecutive probes
///
/// # Returns
///
/// The first mirror answering with a success status, or the first mirror in
/// the list when none does.
#[instrument(level = "info", skip_all, fields(candidates = mirrors.len()))]
pub async fn resolve_mirror(
    transport: &dyn Transport,
    mirrors: &[Url],
    timeout: Duration,
    probe_delay: Duration,
) -> Url {
    for (i, mirror) in mirrors.iter().enumerate() {
        if i > 0 && !probe_delay.is_zero() {
            sleep(probe_delay).await;
        }
        info!(mirror = %mirror, "Probing mirror");
        match transport.send(HttpRequest::head(mirror.as_str(), timeout)).await {
            Ok(resp) if resp.is_success() => {
                info!(mirror = %mirror, "Live mirror found");
                return mirror.clone();
            }
            Ok(resp) => warn!(mirror = %mirror, status = resp.status, "Mirror answered with error status"),
            Err(e) => warn!(mirror = %mirror, error = %e, "Mirror probe failed"),
        }
    }

    let fallback = mirrors[0].clone();
    warn!(mirror = %fallback, "No mirror answered; falling back to the first one");
    fallback
}
