//! Caller-owned memoization of engine output.
//!
//! The engine itself never caches results. Collaborators that call it often
//! (an API façade, a chat bot) put a [`CachedScout`] in front of the
//! [`ScoutService`]: the listing and each event's candidates are kept for an
//! explicit time-to-live and can be invalidated explicitly. Empty results are
//! never stored, so a failed fetch is retried on the next call.

use crate::models::{Event, StreamCandidate};
use crate::service::ScoutService;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument};

/// Default lifetime of both the listing and per-event entries.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// In-memory map whose entries expire after a fixed TTL.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, (Instant, V)>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Live value for `key`; expired entries are evicted on the way.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(key) {
            Some((stored, value)) if stored.elapsed() < self.ttl => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: K, value: V) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, (Instant::now(), value));
    }

    pub fn invalidate(&self, key: &K) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// [`ScoutService`] fronted by a listing cache and a per-event stream cache.
#[derive(Debug)]
pub struct CachedScout {
    service: ScoutService,
    events: TtlCache<(), Vec<Event>>,
    streams: TtlCache<String, Vec<StreamCandidate>>,
}

impl CachedScout {
    pub fn new(service: ScoutService) -> Self {
        Self::with_ttl(service, DEFAULT_TTL, DEFAULT_TTL)
    }

    pub fn with_ttl(service: ScoutService, events_ttl: Duration, streams_ttl: Duration) -> Self {
        Self {
            service,
            events: TtlCache::new(events_ttl),
            streams: TtlCache::new(streams_ttl),
        }
    }

    pub fn service(&self) -> &ScoutService {
        &self.service
    }

    #[instrument(level = "info", skip(self))]
    pub async fn events(&self) -> Vec<Event> {
        if let Some(events) = self.events.get(&()) {
            debug!(count = events.len(), "Serving cached events");
            return events;
        }
        let events = self.service.list_events().await;
        if !events.is_empty() {
            self.events.insert((), events.clone());
        }
        info!(count = events.len(), "Loaded events");
        events
    }

    /// Event at `index` in the current listing.
    pub async fn event_at(&self, index: usize) -> Option<Event> {
        self.events().await.into_iter().nth(index)
    }

    #[instrument(level = "info", skip(self))]
    pub async fn streams(&self, event_url: &str) -> Vec<StreamCandidate> {
        let key = event_url.to_string();
        if let Some(streams) = self.streams.get(&key) {
            debug!(count = streams.len(), "Serving cached streams");
            return streams;
        }
        let streams = self.service.extract_streams(event_url).await;
        if !streams.is_empty() {
            self.streams.insert(key, streams.clone());
        }
        streams
    }

    pub fn invalidate_events(&self) {
        self.events.invalidate(&());
    }

    pub fn invalidate_streams(&self, event_url: &str) {
        self.streams.invalidate(&event_url.to_string());
    }

    pub fn clear(&self) {
        self.events.clear();
        self.streams.clear();
    }
}
