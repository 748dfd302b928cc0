//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Strategies produce:
//!     → histogram.rs (named series: max-pool-size, overflow-pool-size, retry-attempts)
//!     → tracing events (growth, exhaustion, pass-through failures)
//!
//! Consumers:
//!     → MetricsRegistry snapshots (simulation report, tests)
//!     → metrics.rs (Prometheus scrape endpoint via the `metrics` facade)
//!     → logging.rs (stdout, filtered by RUST_LOG)
//! ```
//!
//! # Design Decisions
//! - Strategies depend on the `Metrics` trait only, never on a backend
//! - Series are resolved once per strategy and cached
//! - Metric updates are cheap and non-blocking

pub mod histogram;
pub mod logging;
pub mod metrics;

pub use histogram::{Histogram, HistogramSnapshot, Metrics, MetricsRegistry, RecordingHistogram};
