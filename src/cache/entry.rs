//! A single cached value.

use std::time::Duration;

use bytes::Bytes;
use parking_lot::RwLock;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Instant;

#[derive(Debug)]
struct Slot {
    value: Option<Bytes>,
    expiry: Instant,
}

/// Value and expiry for one canonical key.
///
/// `slot` guards value and expiry together and is only held for plain reads
/// and writes. `fill` is held for the whole handler call of a population or
/// refresh, so at most one handler runs per entry.
#[derive(Debug)]
pub struct CacheEntry {
    slot: RwLock<Slot>,
    fill: Mutex<()>,
}

impl CacheEntry {
    pub(crate) fn new() -> Self {
        Self {
            slot: RwLock::new(Slot {
                value: None,
                expiry: Instant::now(),
            }),
            fill: Mutex::new(()),
        }
    }

    /// Wait for exclusive right to call the handler for this entry.
    pub(crate) async fn lock_fill(&self) -> MutexGuard<'_, ()> {
        self.fill.lock().await
    }

    /// Current value and expiry, if a value is stored.
    pub fn snapshot(&self) -> Option<(Bytes, Instant)> {
        let slot = self.slot.read();
        slot.value.clone().map(|value| (value, slot.expiry))
    }

    /// Store a value that stays fresh for `ttl`; returns the new expiry.
    pub(crate) fn store(&self, value: Bytes, ttl: Duration) -> Instant {
        let expiry = Instant::now() + ttl;
        let mut slot = self.slot.write();
        slot.value = Some(value);
        slot.expiry = expiry;
        expiry
    }

    pub(crate) fn clear(&self) {
        self.slot.write().value = None;
    }

    /// Stale once the expiry is strictly in the past.
    pub fn is_stale_at(expiry: Instant, now: Instant) -> bool {
        expiry < now
    }
}
