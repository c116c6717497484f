//! Prefix trie of registered routes.
//!
//! # Responsibilities
//! - Store handlers and cache policies by path pattern
//! - Resolve decoded request segments to the deepest matching node
//!
//! # Design Decisions
//! - Built with `&mut self` before traffic starts, shared read-only afterwards
//! - One static map and at most one wildcard child per node
//! - Static children shadow the wildcard; one candidate per level, no backtracking
//! - A child copies its parent's policy when it is created and never again

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::CacheError;
use crate::routing::handler::Handler;
use crate::routing::path;

/// Pattern segment matching any single path segment.
pub const WILDCARD: &str = "*";

/// Per-route caching rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CachePolicy {
    /// How long a populated value stays fresh.
    pub ttl: Duration,
}

impl CachePolicy {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self { ttl }
    }
}

/// A resolved handler together with its policy.
#[derive(Clone)]
pub struct Route {
    handler: Arc<dyn Handler>,
    policy: CachePolicy,
}

impl Route {
    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route").field("policy", &self.policy).finish_non_exhaustive()
    }
}

/// A single level of the trie.
pub struct RouteNode {
    handler: Option<Arc<dyn Handler>>,
    static_children: HashMap<String, RouteNode>,
    dynamic_child: Option<Box<RouteNode>>,
    policy: CachePolicy,
}

impl RouteNode {
    fn new(policy: CachePolicy) -> Self {
        Self {
            handler: None,
            static_children: HashMap::new(),
            dynamic_child: None,
            policy,
        }
    }

    fn get_or_create_child(&mut self, segment: &str) -> &mut RouteNode {
        let policy = self.policy;
        if segment == WILDCARD {
            return self
                .dynamic_child
                .get_or_insert_with(|| Box::new(RouteNode::new(policy)))
                .as_mut();
        }
        self.static_children
            .entry(segment.to_string())
            .or_insert_with(|| RouteNode::new(policy))
    }

    /// Static child first, wildcard otherwise.
    fn child(&self, segment: &str) -> Option<&RouteNode> {
        self.static_children
            .get(segment)
            .or(self.dynamic_child.as_deref())
    }

    /// The handler and policy of this node, if a handler is registered here.
    pub fn route(&self) -> Option<Route> {
        self.handler.as_ref().map(|handler| Route {
            handler: Arc::clone(handler),
            policy: self.policy,
        })
    }

    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }
}

impl fmt::Debug for RouteNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteNode")
            .field("has_handler", &self.has_handler())
            .field("static_children", &self.static_children)
            .field("dynamic_child", &self.dynamic_child)
            .field("policy", &self.policy)
            .finish()
    }
}

/// Route table keyed by path segment.
#[derive(Debug)]
pub struct RouteTrie {
    root: RouteNode,
}

impl RouteTrie {
    /// Create an empty trie whose root carries `default_policy`.
    pub fn new(default_policy: CachePolicy) -> Self {
        Self {
            root: RouteNode::new(default_policy),
        }
    }

    /// Replace the root policy. Existing children keep the policy they copied.
    pub fn set_default_policy(&mut self, policy: CachePolicy) {
        self.root.policy = policy;
    }

    /// Register `handler` at `pattern` with an explicit TTL.
    ///
    /// Re-registering the same pattern overwrites the previous handler.
    pub fn register<H: Handler>(
        &mut self,
        pattern: &str,
        handler: H,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        self.insert(pattern, Arc::new(handler), Some(ttl))
    }

    /// Register `handler` at `pattern`, keeping the policy the node inherited.
    pub fn register_inherited<H: Handler>(
        &mut self,
        pattern: &str,
        handler: H,
    ) -> Result<(), CacheError> {
        self.insert(pattern, Arc::new(handler), None)
    }

    fn insert(
        &mut self,
        pattern: &str,
        handler: Arc<dyn Handler>,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let segments = path::decode(pattern).map_err(|_| CacheError::InvalidPattern {
            pattern: pattern.to_string(),
        })?;

        let mut node = &mut self.root;
        for segment in &segments {
            node = node.get_or_create_child(segment);
        }

        node.handler = Some(handler);
        if let Some(ttl) = ttl {
            node.policy = CachePolicy::with_ttl(ttl);
        }

        tracing::debug!(pattern = %pattern, ttl_ms = node.policy.ttl.as_millis() as u64, "Route registered");
        Ok(())
    }

    /// Walk the trie and return the deepest node reached.
    ///
    /// The returned node may have no handler; callers treat that as not found.
    pub fn lookup<S: AsRef<str>>(&self, segments: &[S]) -> &RouteNode {
        let mut node = &self.root;
        for segment in segments {
            match node.child(segment.as_ref()) {
                Some(child) => node = child,
                None => break,
            }
        }
        node
    }
}

impl Default for RouteTrie {
    fn default() -> Self {
        Self::new(CachePolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::handler::BoxError;
    use bytes::Bytes;

    fn body(text: &'static str) -> impl Handler {
        move |_segments: Vec<String>| async move { Ok::<_, BoxError>(Bytes::from_static(text.as_bytes())) }
    }

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn test_static_shadows_wildcard() {
        let mut trie = RouteTrie::default();
        trie.register("/*", body("wild"), secs(2)).unwrap();
        trie.register("/a", body("static"), secs(1)).unwrap();

        assert_eq!(trie.lookup(&["a"]).policy().ttl, secs(1));
        assert_eq!(trie.lookup(&["b"]).policy().ttl, secs(2));
    }

    #[test]
    fn test_static_subtree_wins_even_without_deeper_match() {
        let mut trie = RouteTrie::default();
        trie.register("/a/x", body("ax"), secs(1)).unwrap();
        trie.register("/*/y", body("wy"), secs(2)).unwrap();

        // "a" resolves to the static child; no backtracking into the wildcard subtree.
        let node = trie.lookup(&["a", "y"]);
        assert!(!node.has_handler());
    }

    #[test]
    fn test_lookup_returns_deepest_node() {
        let mut trie = RouteTrie::default();
        trie.register("/greet/*", body("greet"), secs(1)).unwrap();

        let node = trie.lookup(&["greet", "bob", "extra"]);
        assert!(node.has_handler());

        let node = trie.lookup(&["greet"]);
        assert!(!node.has_handler());

        let node = trie.lookup(&["other"]);
        assert!(!node.has_handler());
    }

    #[test]
    fn test_root_lookup() {
        let mut trie = RouteTrie::default();
        let empty: [&str; 0] = [];
        assert!(!trie.lookup(&empty).has_handler());

        trie.register("/", body("root"), secs(3)).unwrap();
        assert!(trie.lookup(&empty).has_handler());
        assert!(trie.lookup(&["anything"]).has_handler());

        let mut trie = RouteTrie::default();
        trie.register("", body("root"), secs(3)).unwrap();
        assert_eq!(trie.lookup(&empty).policy().ttl, secs(3));
    }

    #[test]
    fn test_policy_snapshot_at_creation() {
        let mut trie = RouteTrie::new(CachePolicy::with_ttl(secs(10)));
        trie.register_inherited("/old/leaf", body("old")).unwrap();

        trie.set_default_policy(CachePolicy::with_ttl(secs(20)));
        trie.register_inherited("/new", body("new")).unwrap();

        assert_eq!(trie.lookup(&["old", "leaf"]).policy().ttl, secs(10));
        assert_eq!(trie.lookup(&["new"]).policy().ttl, secs(20));

        // Children created below an explicit TTL copy it.
        trie.register("/parent", body("p"), secs(5)).unwrap();
        trie.register_inherited("/parent/child", body("c")).unwrap();
        assert_eq!(trie.lookup(&["parent", "child"]).policy().ttl, secs(5));
    }

    #[tokio::test]
    async fn test_register_overwrites_handler() {
        let mut trie = RouteTrie::default();
        trie.register("/dup", body("first"), secs(1)).unwrap();
        trie.register("/dup", body("second"), secs(4)).unwrap();

        let route = trie.lookup(&["dup"]).route().unwrap();
        assert_eq!(route.policy().ttl, secs(4));
        let out = route.handler().call(vec!["dup".into()]).await.unwrap();
        assert_eq!(&out[..], b"second");
    }

    #[test]
    fn test_invalid_pattern() {
        let mut trie = RouteTrie::default();
        match trie.register("/bad%zz", body("x"), secs(1)) {
            Err(CacheError::InvalidPattern { pattern }) => assert_eq!(pattern, "/bad%zz"),
            other => panic!("expected InvalidPattern, got {other:?}"),
        }
    }
}
