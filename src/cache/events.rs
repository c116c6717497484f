//! Cache event hook.
//!
//! The store reports what it does through a [`CacheObserver`]. The default
//! for the binary is [`TracingObserver`], which logs each event and bumps the
//! matching counter.

use std::error::Error;

use tokio::time::Instant;

use crate::observability::metrics;

/// A discrete cache event for one canonical key.
#[derive(Debug)]
pub enum CacheEvent<'a> {
    /// No entry existed; a synchronous population starts.
    Miss { key: &'a str },
    /// A fresh value was served.
    Hit { key: &'a str },
    /// An entry exists but has no value yet.
    Empty { key: &'a str },
    /// A stale value was served and a background refresh was spawned.
    RefreshStarted { key: &'a str },
    /// The first population stored a value.
    Populated { key: &'a str, expiry: Instant },
    /// A background refresh replaced the value.
    Refreshed { key: &'a str, expiry: Instant },
    /// The first population failed; the entry was rolled back.
    PopulateFailed {
        key: &'a str,
        error: &'a (dyn Error + 'static),
    },
    /// A background refresh failed; the stale value stays in place.
    RefreshFailed {
        key: &'a str,
        error: &'a (dyn Error + 'static),
    },
}

impl CacheEvent<'_> {
    /// Stable label used for metrics and tests.
    pub fn kind(&self) -> &'static str {
        match self {
            CacheEvent::Miss { .. } => "miss",
            CacheEvent::Hit { .. } => "hit",
            CacheEvent::Empty { .. } => "empty",
            CacheEvent::RefreshStarted { .. } => "refresh_started",
            CacheEvent::Populated { .. } => "populated",
            CacheEvent::Refreshed { .. } => "refreshed",
            CacheEvent::PopulateFailed { .. } => "populate_failed",
            CacheEvent::RefreshFailed { .. } => "refresh_failed",
        }
    }

    pub fn key(&self) -> &str {
        match self {
            CacheEvent::Miss { key }
            | CacheEvent::Hit { key }
            | CacheEvent::Empty { key }
            | CacheEvent::RefreshStarted { key }
            | CacheEvent::Populated { key, .. }
            | CacheEvent::Refreshed { key, .. }
            | CacheEvent::PopulateFailed { key, .. }
            | CacheEvent::RefreshFailed { key, .. } => key,
        }
    }
}

/// Sink for cache events. Called inline, so implementations must be cheap.
pub trait CacheObserver: Send + Sync + 'static {
    fn on_event(&self, event: &CacheEvent<'_>);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl CacheObserver for NoopObserver {
    fn on_event(&self, _event: &CacheEvent<'_>) {}
}

/// Logs events with `tracing` and counts them with `metrics`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl CacheObserver for TracingObserver {
    fn on_event(&self, event: &CacheEvent<'_>) {
        metrics::record_cache_event(event.kind());

        match event {
            CacheEvent::Miss { key } => tracing::debug!(key = %key, "Cache miss"),
            CacheEvent::Hit { key } => tracing::debug!(key = %key, "Cache hit"),
            CacheEvent::Empty { key } => {
                tracing::debug!(key = %key, "Cache entry has no value yet")
            }
            CacheEvent::RefreshStarted { key } => {
                tracing::debug!(key = %key, "Serving stale value, refresh started")
            }
            CacheEvent::Populated { key, expiry } => tracing::debug!(
                key = %key,
                expiry_in_ms = millis_until(*expiry),
                "Cache entry populated"
            ),
            CacheEvent::Refreshed { key, expiry } => tracing::debug!(
                key = %key,
                expiry_in_ms = millis_until(*expiry),
                "Cache entry refreshed"
            ),
            CacheEvent::PopulateFailed { key, error } => {
                tracing::warn!(key = %key, error = %error, "Cache population failed")
            }
            CacheEvent::RefreshFailed { key, error } => {
                tracing::warn!(key = %key, error = %error, "Cache refresh failed, keeping stale value")
            }
        }
    }
}

fn millis_until(expiry: Instant) -> u64 {
    expiry.saturating_duration_since(Instant::now()).as_millis() as u64
}
