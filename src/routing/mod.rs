//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (before serving):
//!     pattern "/greet/*"
//!     → path.rs (decode segments)
//!     → trie.rs (walk/create nodes, copy parent policy into new nodes)
//!     → handler + policy stored on the terminal node
//!
//! Request:
//!     escaped path
//!     → path.rs (decode, canonical key)
//!     → trie.rs (static child, else wildcard, else stop)
//!     → deepest node reached
//! ```
//!
//! # Design Decisions
//! - Trie is immutable once serving starts (shared without locks)
//! - No regex and no backtracking: matching is O(depth)
//! - Deterministic: same segments always resolve to the same node

pub mod handler;
pub mod path;
pub mod trie;

pub use handler::{BoxError, Handler, HandlerResult};
pub use trie::{CachePolicy, Route, RouteNode, RouteTrie, WILDCARD};
