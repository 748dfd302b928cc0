//! Metrics exposition.
//!
//! # Responsibilities
//! - Bridge in-process histograms to the `metrics` facade
//! - Expose a Prometheus-compatible scrape endpoint
//!
//! # Metrics
//! - `max-pool-size` (histogram): capacity visited by each acquisition attempt
//! - `overflow-pool-size` (histogram): growth count within one acquisition
//! - `retry-attempts` (histogram): retries a call needed
//!
//! Facade names replace `-` with `_` (`max_pool_size`), as Prometheus requires.

use std::net::SocketAddr;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Facade histogram handle for a series name.
pub fn facade_histogram(name: &str) -> ::metrics::Histogram {
    ::metrics::histogram!(facade_name(name))
}

fn facade_name(name: &str) -> String {
    name.replace('-', "_")
}

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}
