//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → latch → HttpServer stops accepting → in-flight requests drain → exit
//! ```
//!
//! # Design Decisions
//! - Background refresh tasks are not awaited on shutdown; the cache is not persisted

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownListener};
