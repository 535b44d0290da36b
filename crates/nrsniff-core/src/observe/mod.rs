//! Observability for the acquisition frontend.
//!
//! Two pillars, both borrowed from the wider SDR tooling this frontend
//! sits in:
//!
//! - **Logging**: structured events via `tracing`, configured by a
//!   serde-able [`LogConfig`]
//! - **Metrics**: per-controller atomic counters and a pull-latency
//!   histogram ([`SnifferMetrics`]), so concurrent controller instances
//!   never share state
//!
//! ```rust,ignore
//! use nrsniff_core::observe::{init_logging, LogConfig, SnifferMetrics};
//!
//! init_logging(&LogConfig::default());
//! let metrics = SnifferMetrics::new();
//! metrics.chunks_pulled.inc();
//! tracing::info!(chunks = metrics.chunks_pulled.get(), "progress");
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
pub use metrics::{Counter, Histogram, MetricsSnapshot, SnifferMetrics};
