//! In-process HTTP response cache with stale-while-revalidate refresh.

pub mod cache;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::CacheConfig;
pub use dispatch::{CacheBuilder, MiniCache};
pub use error::CacheError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{BoxError, Handler, HandlerResult};
