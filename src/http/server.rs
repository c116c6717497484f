//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with a single fallback into the cache
//! - Wire up middleware (request ID, tracing, timeout)
//! - Serve on a listener until shutdown is signalled

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request, Uri},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::CacheConfig;
use crate::dispatch::MiniCache;
use crate::http::request::{request_id_of, x_request_id, MakeRequestUuidV4};
use crate::http::response::cached_body;
use crate::lifecycle::ShutdownListener;
use crate::observability::metrics;

const FALLBACK_CONTENT_TYPE: &str = "application/json";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub cache: MiniCache,
    pub content_type: HeaderValue,
}

/// HTTP front end for a [`MiniCache`].
pub struct HttpServer {
    router: Router,
    config: Arc<CacheConfig>,
}

impl HttpServer {
    /// Create a new HTTP server serving `cache`.
    pub fn new(config: CacheConfig, cache: MiniCache) -> Self {
        let content_type = HeaderValue::from_str(&config.cache.content_type).unwrap_or_else(|_| {
            tracing::warn!(
                content_type = %config.cache.content_type,
                fallback = FALLBACK_CONTENT_TYPE,
                "Invalid content type, using fallback"
            );
            HeaderValue::from_static(FALLBACK_CONTENT_TYPE)
        });

        let state = AppState {
            cache,
            content_type,
        };
        let router = Self::build_router(&config, state);
        Self {
            router,
            config: Arc::new(config),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &CacheConfig, state: AppState) -> Router {
        Router::new()
            .fallback(cache_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::new(x_request_id()))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id_of(request),
                )
            }))
            .layer(SetRequestIdLayer::new(x_request_id(), MakeRequestUuidV4))
    }

    /// The fully layered router, for embedding or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, shutdown: ShutdownListener) -> io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            request_timeout_secs = self.config.timeouts.request_secs,
            "HTTP server starting"
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
}

/// Every method and path lands here.
async fn cache_handler(State(state): State<AppState>, uri: Uri) -> Response {
    let start = Instant::now();

    let response = match state.cache.handle(uri.path()).await {
        Ok(body) => cached_body(body, state.content_type.clone()),
        Err(error) => {
            if error.is_retryable() {
                tracing::debug!(path = %uri.path(), error = %error, "Cache entry not ready");
            } else {
                tracing::warn!(path = %uri.path(), error = %error, "Request failed");
            }
            error.into_response()
        }
    };

    metrics::record_request(response.status().as_u16(), start);
    metrics::record_cache_size(state.cache.entry_count());
    response
}
