//! Metrics collection and exposition.
//!
//! # Metrics
//! - `minicache_http_requests_total` (counter): requests by status
//! - `minicache_http_request_duration_seconds` (histogram): latency distribution
//! - `minicache_cache_events_total` (counter): cache events by kind
//! - `minicache_entries` (gauge): keys currently held
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and serve scrapes on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(status: u16, start: Instant) {
    let status = status.to_string();
    metrics::counter!("minicache_http_requests_total", "status" => status.clone()).increment(1);
    metrics::histogram!("minicache_http_request_duration_seconds", "status" => status)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_cache_event(kind: &'static str) {
    metrics::counter!("minicache_cache_events_total", "event" => kind).increment(1);
}

pub fn record_cache_size(entries: usize) {
    metrics::gauge!("minicache_entries").set(entries as f64);
}
