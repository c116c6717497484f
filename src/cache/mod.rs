//! Response cache subsystem.
//!
//! # Data Flow
//! ```text
//! CacheStore::request(route, segments)
//!     → store.rs (map lookup / insert under shard lock)
//!     → entry.rs (value + expiry, fill lock around handler calls)
//!     → events.rs (miss / hit / empty / refresh / failure hooks)
//! ```

pub mod entry;
pub mod events;
pub mod store;

pub use entry::CacheEntry;
pub use events::{CacheEvent, CacheObserver, NoopObserver, TracingObserver};
pub use store::CacheStore;
