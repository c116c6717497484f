//! Concurrent response store with stale-while-revalidate refresh.
//!
//! # Data Flow
//! ```text
//! request(route, segments)
//!     → canonical key
//!     → absent:  insert empty entry, release map shard, populate synchronously
//!                  ok  → store value, expiry = now + ttl
//!                  err → clear, remove entry, return HandlerFailed
//!     → present: read value under the entry's shared lock
//!                  none  → CacheEmpty (never waits for a population)
//!                  stale → return value, spawn refresh
//!                  fresh → return value
//! ```
//!
//! # Design Decisions
//! - The map shard lock is never held across a handler call
//! - Handler calls for one key are serialized by the entry's fill lock
//! - Populations run in their own task so a dropped caller cannot strand an empty entry
//! - A panicking handler is reported like a handler error, on populate and on refresh
//! - Stale reads are not deduplicated; each one queues a refresh
//! - No eviction: entries live until the store is dropped

use std::sync::Arc;

use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::time::Instant;

use crate::cache::entry::CacheEntry;
use crate::cache::events::{CacheEvent, CacheObserver, NoopObserver};
use crate::error::CacheError;
use crate::observability::metrics;
use crate::routing::handler::BoxError;
use crate::routing::path;
use crate::routing::trie::Route;

/// Thread-safe map from canonical path to cached body.
#[derive(Clone)]
pub struct CacheStore {
    entries: Arc<DashMap<String, Arc<CacheEntry>>>,
    observer: Arc<dyn CacheObserver>,
}

impl CacheStore {
    /// Create an empty store reporting to `observer`.
    pub fn new(observer: Arc<dyn CacheObserver>) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            observer,
        }
    }

    /// Serve `segments` through `route`, populating or refreshing as needed.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn request(&self, route: &Route, segments: Vec<String>) -> Result<Bytes, CacheError> {
        let key = path::canonicalize(&segments);
        let (entry, created) = self.get_or_insert(&key);

        if created {
            self.populate(route, key, segments, entry).await
        } else {
            self.serve(route, key, segments, &entry)
        }
    }

    /// Number of entries currently held, including ones still populating.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current value and expiry stored under a canonical key.
    pub fn peek(&self, key: &str) -> Option<(Bytes, Instant)> {
        self.entries.get(key).and_then(|entry| entry.snapshot())
    }

    fn get_or_insert(&self, key: &str) -> (Arc<CacheEntry>, bool) {
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(occupied) => (Arc::clone(occupied.get()), false),
            Entry::Vacant(vacant) => {
                let entry = Arc::new(CacheEntry::new());
                vacant.insert(Arc::clone(&entry));
                metrics::record_cache_size(self.entries.len());
                (entry, true)
            }
        }
    }

    /// Remove `entry` from the map unless it has already been replaced.
    fn evict(&self, key: &str, entry: &Arc<CacheEntry>) {
        self.entries
            .remove_if(key, |_, current| Arc::ptr_eq(current, entry));
        metrics::record_cache_size(self.entries.len());
    }

    async fn populate(
        &self,
        route: &Route,
        key: String,
        segments: Vec<String>,
        entry: Arc<CacheEntry>,
    ) -> Result<Bytes, CacheError> {
        self.observer.on_event(&CacheEvent::Miss { key: &key });

        let store = self.clone();
        let handler = Arc::clone(route.handler());
        let ttl = route.policy().ttl;
        let task_entry = Arc::clone(&entry);
        let task_key = key.clone();

        let task = tokio::spawn(async move {
            let entry = task_entry;
            let key = task_key;
            let fill = entry.lock_fill().await;
            match handler.call(segments).await {
                Ok(body) => {
                    let expiry = entry.store(body.clone(), ttl);
                    drop(fill);
                    store.observer.on_event(&CacheEvent::Populated { key: &key, expiry });
                    Ok(body)
                }
                Err(source) => {
                    entry.clear();
                    drop(fill);
                    store.evict(&key, &entry);
                    store.observer.on_event(&CacheEvent::PopulateFailed {
                        key: &key,
                        error: &*source,
                    });
                    Err(CacheError::HandlerFailed { key, source })
                }
            }
        });

        match task.await {
            Ok(result) => result,
            Err(join_error) => {
                // The handler panicked; the entry never received a value.
                self.evict(&key, &entry);
                let source: BoxError = Box::new(join_error);
                self.observer.on_event(&CacheEvent::PopulateFailed {
                    key: &key,
                    error: &*source,
                });
                Err(CacheError::HandlerFailed { key, source })
            }
        }
    }

    fn serve(
        &self,
        route: &Route,
        key: String,
        segments: Vec<String>,
        entry: &Arc<CacheEntry>,
    ) -> Result<Bytes, CacheError> {
        let Some((value, expiry)) = entry.snapshot() else {
            self.observer.on_event(&CacheEvent::Empty { key: &key });
            return Err(CacheError::CacheEmpty { key });
        };

        if CacheEntry::is_stale_at(expiry, Instant::now()) {
            self.observer.on_event(&CacheEvent::RefreshStarted { key: &key });
            self.spawn_refresh(route, key, segments, Arc::clone(entry));
        } else {
            self.observer.on_event(&CacheEvent::Hit { key: &key });
        }

        Ok(value)
    }

    fn spawn_refresh(&self, route: &Route, key: String, segments: Vec<String>, entry: Arc<CacheEntry>) {
        let observer = Arc::clone(&self.observer);
        let handler = Arc::clone(route.handler());
        let ttl = route.policy().ttl;

        tokio::spawn(async move {
            let _fill = entry.lock_fill().await;
            // Own task so a panicking handler surfaces as a JoinError.
            let result = match tokio::spawn(handler.call(segments)).await {
                Ok(result) => result,
                Err(join_error) => Err(Box::new(join_error) as BoxError),
            };
            match result {
                Ok(body) => {
                    let expiry = entry.store(body, ttl);
                    observer.on_event(&CacheEvent::Refreshed { key: &key, expiry });
                }
                Err(error) => {
                    observer.on_event(&CacheEvent::RefreshFailed {
                        key: &key,
                        error: &*error,
                    });
                }
            }
        });
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new(Arc::new(NoopObserver))
    }
}
