//! HTTP capability used by every network-touching component.
//!
//! # Architecture
//!
//! - [`Transport`]: the seam the engine talks to; one `send` call per request
//! - [`ReqwestTransport`]: the real client, one shared `reqwest::Client`
//!   carrying default headers, redirect following and the TLS switch
//! - [`RetryTransport`]: decorator adding bounded retries to idempotent verbs
//!
//! # Retry Strategy
//!
//! - Only GET and HEAD are retried; POST goes through once
//! - Retries on the configured statuses (429/500/502/503/504 by default) and on
//!   connection errors
//! - Exponential backoff from the base delay, capped, plus random jitter
//!
//! Non-success statuses are not errors at this layer; callers decide what a
//! 404 means for them.

use crate::config::{RetryConfig, ScoutConfig};
use crate::error::{Result, ScoutError};
use async_trait::async_trait;
use rand::{Rng, rng};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::redirect::Policy;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, warn};

/// HTTP verb; only what the engine needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Head,
    Post,
}

impl Verb {
    pub fn is_idempotent(self) -> bool {
        matches!(self, Verb::Get | Verb::Head)
    }
}

/// A single outgoing request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub verb: Verb,
    pub url: String,
    /// Extra headers on top of the client defaults.
    pub headers: Vec<(String, String)>,
    /// Form fields; sent url-encoded when non-empty.
    pub form: Vec<(String, String)>,
    pub timeout: Duration,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>, timeout: Duration) -> Self {
        Self::new(Verb::Get, url, timeout)
    }

    pub fn head(url: impl Into<String>, timeout: Duration) -> Self {
        Self::new(Verb::Head, url, timeout)
    }

    pub fn post(url: impl Into<String>, timeout: Duration) -> Self {
        Self::new(Verb::Post, url, timeout)
    }

    fn new(verb: Verb, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            verb,
            url: url.into(),
            headers: Vec::new(),
            form: Vec::new(),
            timeout,
        }
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn field(mut self, name: &str, value: impl Into<String>) -> Self {
        self.form.push((name.to_string(), value.into()));
        self
    }

    /// `application/x-www-form-urlencoded` body for the form fields.
    pub fn encoded_form(&self) -> String {
        self.form
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Status and body of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Empty for HEAD.
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body of a successful response, or a [`ScoutError::Status`].
    pub fn into_text(self, url: &str) -> Result<String> {
        if self.is_success() {
            Ok(self.body)
        } else {
            Err(ScoutError::Status {
                url: url.to_string(),
                status: self.status,
            })
        }
    }
}

/// Anything able to execute an [`HttpRequest`].
///
/// Implementations must be safe to share between pooled workers.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// Production transport backed by a single `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build the shared client from the configured headers and TLS policy.
    pub fn new(config: &ScoutConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(n), Ok(v)) => {
                    headers.insert(n, v);
                }
                _ => warn!(header = %name, "Skipping malformed default header"),
            }
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .redirect(Policy::limited(10))
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(ScoutError::Client)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let transport_err = |source| ScoutError::Transport {
            url: request.url.clone(),
            source,
        };

        let mut builder = match request.verb {
            Verb::Get => self.client.get(&request.url),
            Verb::Head => self.client.head(&request.url),
            Verb::Post => self.client.post(&request.url),
        }
        .timeout(request.timeout);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.form.is_empty() {
            builder = builder
                .header(
                    "Content-Type",
                    "application/x-www-form-urlencoded; charset=UTF-8",
                )
                .body(request.encoded_form());
        }

        let response = builder.send().await.map_err(transport_err)?;
        let status = response.status().as_u16();
        let body = if request.verb == Verb::Head {
            String::new()
        } else {
            response.text().await.map_err(transport_err)?
        };
        debug!(url = %request.url, status, bytes = body.len(), "HTTP exchange complete");
        Ok(HttpResponse { status, body })
    }
}

/// Decorator that retries idempotent requests on transient failures.
///
/// # Backoff Strategy
///
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..=jitter)
/// ```
pub struct RetryTransport<T> {
    inner: T,
    policy: RetryConfig,
}

impl<T> RetryTransport<T>
where
    T: Transport,
{
    pub fn new(inner: T, policy: RetryConfig) -> Self {
        Self { inner, policy }
    }

    fn backoff(&self, attempt: usize) -> Duration {
        let shift = (attempt - 1).min(16) as u32;
        let delay = self
            .policy
            .base_delay()
            .saturating_mul(1 << shift)
            .min(self.policy.max_delay());
        let jitter_ms: u64 = rng().random_range(0..=self.policy.jitter_ms);
        delay + Duration::from_millis(jitter_ms)
    }
}

impl<T> fmt::Debug for RetryTransport<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryTransport")
            .field("policy", &self.policy)
            .finish()
    }
}

#[async_trait]
impl<T> Transport for RetryTransport<T>
where
    T: Transport,
{
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        if !request.verb.is_idempotent() {
            return self.inner.send(request).await;
        }

        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let result = self.inner.send(request.clone()).await;
            let retryable = match &result {
                Ok(resp) => self.policy.is_retryable(resp.status),
                Err(e) => e.is_connect(),
            };
            if !retryable {
                return result;
            }

            attempt += 1;
            if attempt > self.policy.max_retries {
                error!(
                    url = %request.url,
                    attempt,
                    max = self.policy.max_retries,
                    elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                    "Request exhausted retries"
                );
                return result;
            }

            let delay = self.backoff(attempt);
            match &result {
                Ok(resp) => warn!(url = %request.url, attempt, status = resp.status, ?delay, "Retryable status; backing off"),
                Err(e) => warn!(url = %request.url, attempt, error = %e, ?delay, "Connection failed; backing off"),
            }
            sleep(delay).await;
        }
    }
}

/// Build the production transport stack for a config.
pub fn default_transport(config: &ScoutConfig) -> Result<RetryTransport<ReqwestTransport>> {
    Ok(RetryTransport::new(
        ReqwestTransport::new(config)?,
        config.retry.clone(),
    ))
}
