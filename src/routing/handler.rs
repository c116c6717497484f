//! Handler contract.
//!
//! A handler receives the decoded path segments and produces the response
//! body. It must be safe to call concurrently for different keys and safe to
//! call again for the same key after a failure.

use std::future::Future;

use bytes::Bytes;
use futures_util::future::BoxFuture;

/// Boxed error returned by handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result of a single handler invocation.
pub type HandlerResult = Result<Bytes, BoxError>;

/// Produces the body cached for a path.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, segments: Vec<String>) -> BoxFuture<'static, HandlerResult>;
}

impl<F, Fut> Handler for F
where
    F: Fn(Vec<String>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, segments: Vec<String>) -> BoxFuture<'static, HandlerResult> {
        Box::pin(self(segments))
    }
}
