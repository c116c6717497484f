//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Cache events and HTTP requests produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (compact or pretty format)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Request ID is attached to every request span
//! - Metrics are cheap and no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
