//! Reachability filter.
//!
//! A HEAD request with a short timeout, redirects followed. Any failure
//! (timeout, refused connection, TLS, malformed URL, non-success status)
//! means "not reachable". This is a noise filter, not a liveness guarantee:
//! nothing stops a link from dying right after it passed.

use crate::http::{HttpRequest, Transport};
use std::time::Duration;
use tracing::{debug, instrument};

/// Probe `url` once and report whether it answered with a success status.
///
/// # Arguments
///
/// * `transport` - Transport used for the HEAD request
/// * `url` - Absolute http(s) URL to check
/// * `timeout` - Probe timeout
///
/// # Returns
///
/// `true` for a 2xx answer; `false` for anything else, errors included.
#[instrument(level = "debug", skip(transport))]
pub async fn is_reachable(transport: &dyn Transport, url: &str, timeout: Duration) -> bool {
    if url::Url::parse(url).is_err() {
        debug!("Malformed URL; treating as unreachable");
        return false;
    }
    match transport.send(HttpRequest::head(url, timeout)).await {
        Ok(resp) if resp.is_success() => true,
        Ok(resp) => {
            debug!(status = resp.status, "Probe answered with non-success status");
            false
        }
        Err(e) => {
            debug!(error = %e, "Probe failed");
            false
        }
    }
}
