//! Error type shared by the engine internals.
//!
//! Nothing in here reaches a collaborator directly: the public engine
//! operations degrade every [`ScoutError`] into an empty result plus an
//! [`Outcome::Failed`](crate::models::Outcome::Failed) entry.

use thiserror::Error;

/// Everything that can go wrong while probing, fetching or parsing.
#[derive(Debug, Error)]
pub enum ScoutError {
    /// Connection, timeout, TLS or body-read failure.
    #[error("transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered, but not with a success status.
    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("invalid url {url:?}: {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The event page itself could not be fetched, so markup-based
    /// strategies have nothing to scan.
    #[error("event page unavailable: {0}")]
    PageUnavailable(String),

    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    ConfigInvalid(String),

    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    /// Canned failure served by the in-memory test transport.
    #[cfg(test)]
    #[error("simulated failure for {0}")]
    Simulated(String),

    /// A pooled worker panicked or was aborted.
    #[error("worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl ScoutError {
    /// True when the failure is a connection-level problem worth retrying.
    pub fn is_connect(&self) -> bool {
        matches!(self, ScoutError::Transport { source, .. } if source.is_connect())
    }
}

pub type Result<T> = std::result::Result<T, ScoutError>;
