//! Async adapter: run engine calls on a bounded pool of spawned workers.
//!
//! Each call is spawned as its own tokio task and has to take one of a fixed
//! number of permits before it touches the network, so at most `workers`
//! engine operations are in flight at once. Dropping the caller's future does
//! not cancel the worker: an extraction that has started runs to completion.
//! Concurrent calls for the same event are not coalesced; wrap the service in
//! a [`CachedScout`](crate::cache::CachedScout) for that.

use crate::error::Result;
use crate::models::{Event, Extraction, Listing, Outcome, StreamCandidate};
use crate::scout::Scout;
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, instrument};

#[derive(Debug, Clone)]
pub struct ScoutService {
    scout: Arc<Scout>,
    permits: Arc<Semaphore>,
}

impl ScoutService {
    /// Pool sized from the engine's `workers` setting.
    pub fn new(scout: Scout) -> Self {
        let workers = scout.config().workers;
        Self::with_workers(scout, workers)
    }

    pub fn with_workers(scout: Scout, workers: usize) -> Self {
        Self {
            scout: Arc::new(scout),
            permits: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    pub fn scout(&self) -> &Scout {
        &self.scout
    }

    /// Run `job` on a pooled worker and wait for its result.
    async fn dispatch<F, Fut, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(Arc<Scout>) -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let scout = Arc::clone(&self.scout);
        let permits = Arc::clone(&self.permits);
        let handle = tokio::spawn(async move {
            // The semaphore is never closed.
            let _permit = permits.acquire_owned().await.ok();
            debug!("Worker acquired");
            job(scout).await
        });
        Ok(handle.await?)
    }

    pub async fn list_events(&self) -> Vec<Event> {
        self.listing().await.events
    }

    #[instrument(level = "info", skip(self))]
    pub async fn listing(&self) -> Listing {
        match self
            .dispatch(|scout| async move { scout.listing().await })
            .await
        {
            Ok(listing) => listing,
            Err(e) => {
                error!(error = %e, "Listing worker failed");
                Listing {
                    base_url: String::new(),
                    events: Vec::new(),
                    outcome: Outcome::Failed(e.to_string()),
                    fetched_at: Utc::now(),
                }
            }
        }
    }

    pub async fn extract_streams(&self, event_url: &str) -> Vec<StreamCandidate> {
        self.extraction(event_url).await.candidates
    }

    #[instrument(level = "info", skip(self))]
    pub async fn extraction(&self, event_url: &str) -> Extraction {
        let url = event_url.to_string();
        match self
            .dispatch(move |scout| async move { scout.extraction(&url).await })
            .await
        {
            Ok(extraction) => extraction,
            Err(e) => {
                error!(error = %e, "Extraction worker failed");
                Extraction {
                    event_url: event_url.to_string(),
                    page_title: None,
                    candidates: Vec::new(),
                    reports: Vec::new(),
                    extracted_at: Utc::now(),
                }
            }
        }
    }
}
