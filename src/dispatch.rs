//! Request dispatch: path → route → cached body.
//!
//! # Data Flow
//! ```text
//! raw escaped path
//!     → routing::path::decode   (DecodeFailed)
//!     → RouteTrie::lookup       (NotFound when the node has no handler)
//!     → CacheStore::request     (HandlerFailed / CacheEmpty)
//!     → body bytes
//! ```

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use crate::cache::events::{CacheObserver, NoopObserver};
use crate::cache::store::CacheStore;
use crate::error::CacheError;
use crate::routing::handler::Handler;
use crate::routing::path;
use crate::routing::trie::{CachePolicy, RouteTrie};

/// Collects routes and options before the cache starts serving.
///
/// Every method takes `&mut self`, so options and routes chain the same way:
///
/// ```ignore
/// let mut builder = MiniCache::builder();
/// builder.default_ttl(Duration::from_secs(30)).observer(TracingObserver);
/// builder.register_inherited("/greet/*", greet)?;
/// let cache = builder.build();
/// ```
pub struct CacheBuilder {
    trie: RouteTrie,
    observer: Arc<dyn CacheObserver>,
    registered: usize,
}

impl CacheBuilder {
    fn new() -> Self {
        Self {
            trie: RouteTrie::default(),
            observer: Arc::new(NoopObserver),
            registered: 0,
        }
    }

    /// Set the root TTL that nodes created afterwards copy.
    ///
    /// Call this before registering routes. Nodes already created keep the
    /// TTL they copied, and a route registered at `/` has its TTL replaced.
    pub fn default_ttl(&mut self, ttl: Duration) -> &mut Self {
        if self.registered > 0 {
            tracing::warn!(
                ttl_ms = ttl.as_millis() as u64,
                registered = self.registered,
                "Default TTL set after routes were registered; existing routes keep their TTL"
            );
        }
        self.trie.set_default_policy(CachePolicy::with_ttl(ttl));
        self
    }

    /// Install the event hook.
    pub fn observer<O: CacheObserver>(&mut self, observer: O) -> &mut Self {
        self.observer = Arc::new(observer);
        self
    }

    /// Register `handler` at `pattern`; `*` segments match any single segment.
    pub fn register<H: Handler>(
        &mut self,
        pattern: &str,
        handler: H,
        ttl: Duration,
    ) -> Result<&mut Self, CacheError> {
        self.trie.register(pattern, handler, ttl)?;
        self.registered += 1;
        Ok(self)
    }

    /// Register `handler` at `pattern` with the TTL the node inherits.
    pub fn register_inherited<H: Handler>(
        &mut self,
        pattern: &str,
        handler: H,
    ) -> Result<&mut Self, CacheError> {
        self.trie.register_inherited(pattern, handler)?;
        self.registered += 1;
        Ok(self)
    }

    /// Freeze the routes and create the cache.
    pub fn build(self) -> MiniCache {
        MiniCache {
            trie: Arc::new(self.trie),
            store: CacheStore::new(self.observer),
        }
    }
}

/// Route table plus response store. Cheap to clone.
#[derive(Clone)]
pub struct MiniCache {
    trie: Arc<RouteTrie>,
    store: CacheStore,
}

impl MiniCache {
    pub fn builder() -> CacheBuilder {
        CacheBuilder::new()
    }

    /// Resolve `raw_path` and return its body, from cache when possible.
    pub async fn handle(&self, raw_path: &str) -> Result<Bytes, CacheError> {
        let segments = path::decode(raw_path)?;

        let route = self
            .trie
            .lookup(&segments)
            .route()
            .ok_or_else(|| CacheError::NotFound {
                path: path::canonicalize(&segments),
            })?;

        self.store.request(&route, segments).await
    }

    /// Number of cached (or populating) keys.
    pub fn entry_count(&self) -> usize {
        self.store.len()
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn routes(&self) -> &RouteTrie {
        &self.trie
    }
}
