//! minicache demo server
//!
//! Serves an echo handler through the response cache: every path is answered
//! with its decoded segments as a JSON array, cached per canonical path.
//!
//! ```text
//!     Client Request
//!     ───────────────▶ axum (request id, trace, timeout)
//!                          │
//!                          ▼
//!                      MiniCache::handle
//!                          │ decode → trie lookup → CacheStore
//!                          ▼
//!                      echo handler (only on miss / stale refresh)
//! ```

use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;
use clap::Parser;
use tokio::net::TcpListener;

use minicache::cache::TracingObserver;
use minicache::config::{load_config, validation::validate_config, CacheConfig, ConfigError};
use minicache::lifecycle::signals::spawn_signal_listener;
use minicache::observability::{logging, metrics};
use minicache::{BoxError, HttpServer, MiniCache, Shutdown};

#[derive(Debug, Parser)]
#[command(name = "minicache")]
#[command(about = "Caching HTTP server with stale-while-revalidate refresh", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override the default TTL in seconds.
    #[arg(long)]
    ttl_secs: Option<u64>,

    /// Route pattern the echo handler is registered at.
    #[arg(long, default_value = "/")]
    pattern: String,

    /// Artificial handler latency in milliseconds.
    #[arg(long, default_value_t = 0)]
    delay_ms: u64,
}

impl Cli {
    fn load(&self) -> Result<CacheConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => CacheConfig::default(),
        };
        if let Some(bind) = &self.bind {
            config.listener.bind_address = bind.clone();
        }
        if let Some(ttl) = self.ttl_secs {
            config.cache.default_ttl_secs = ttl;
        }
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

/// Echo the decoded segments back as a JSON array.
fn echo(delay: Duration) -> impl minicache::Handler {
    move |segments: Vec<String>| async move {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let body = serde_json::to_vec(&segments)?;
        Ok::<_, BoxError>(Bytes::from(body))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = cli.load()?;

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "minicache starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        default_ttl_secs = config.cache.default_ttl_secs,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let mut builder = MiniCache::builder();
    builder
        .default_ttl(config.cache.default_ttl())
        .observer(TracingObserver)
        .register_inherited(&cli.pattern, echo(Duration::from_millis(cli.delay_ms)))?;
    let cache = builder.build();

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, pattern = %cli.pattern, "Listening for connections");

    let shutdown = Shutdown::new();
    spawn_signal_listener(shutdown.clone());

    let server = HttpServer::new(config, cache);
    server.run(listener, shutdown.listener()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
