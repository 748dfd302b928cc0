//! Load simulation against an in-process bounded pool.
//!
//! # Data Flow
//! ```text
//! AppConfig
//!     → BoundedPool (initial capacity, per-attempt timeout)
//!     → AdaptivePool (increment strategy, optional retry strategy)
//!     → N blocking workers, each: acquire → hold → release
//!     → SimulationReport (outcomes, latency percentiles, histogram snapshots)
//! ```

use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use rand::Rng;
use serde::Serialize;
use thiserror::Error;

use crate::config::AppConfig;
use crate::error::AcquireError;
use crate::observability::{HistogramSnapshot, MetricsRegistry};
use crate::pool::{AdaptivePool, BoundedPool, RequestContext};
use crate::strategy::{Configuration, StrategyFactory};

/// A simulated pooled connection.
#[derive(Debug)]
pub struct SimConnection {
    pub id: u64,
}

/// Errors that abort a simulation run.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Latency percentiles of successful acquisitions, in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LatencySummary {
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub max_ms: f64,
}

/// Outcome of a simulation run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub pool: String,
    pub workers: usize,
    pub requests: usize,
    pub acquired: usize,
    pub exhausted: usize,
    pub failed: usize,
    pub initial_capacity: usize,
    pub final_capacity: usize,
    pub ceiling: usize,
    pub connections_created: u64,
    pub elapsed_ms: u128,
    pub latency: LatencySummary,
    pub histograms: Vec<HistogramSnapshot>,
}

#[derive(Debug, Default)]
struct WorkerStats {
    latencies: Vec<Duration>,
    exhausted: usize,
    failed: usize,
}

/// Run the configured workload and collect a report.
pub async fn run(
    config: &AppConfig,
    registry: Arc<MetricsRegistry>,
) -> Result<SimulationReport, SimulationError> {
    let created = Arc::new(AtomicU64::new(0));
    let counter = created.clone();
    let bounded = BoundedPool::new(
        config.pool.initial_capacity,
        config.pool.acquire_timeout(),
        move || {
            Ok(SimConnection {
                id: counter.fetch_add(1, Ordering::Relaxed),
            })
        },
    );

    let wiring = Configuration::new(config.pool.name.clone(), Arc::new(bounded), registry.clone());
    let increment = config.strategy.increment_factory();
    let retry = config.strategy.retry_factory();
    let mut factories: Vec<&dyn StrategyFactory<BoundedPool<SimConnection>>> = Vec::new();
    factories.push(&increment);
    if let Some(retry) = &retry {
        factories.push(retry);
    }
    let pool = Arc::new(AdaptivePool::new(wiring, &factories));

    let sim = &config.simulation;
    tracing::info!(
        pool = %config.pool.name,
        workers = sim.workers,
        iterations = sim.iterations,
        initial_capacity = config.pool.initial_capacity,
        ceiling = config.strategy.ceiling,
        "Simulation starting"
    );

    let started = Instant::now();
    let mut tasks = Vec::with_capacity(sim.workers);
    for worker in 0..sim.workers {
        let pool = pool.clone();
        let iterations = sim.iterations;
        let hold = sim.hold_ms_min..=sim.hold_ms_max;
        tasks.push(tokio::task::spawn_blocking(move || {
            run_worker(worker, &pool, iterations, hold)
        }));
    }

    let mut total = WorkerStats::default();
    for task in tasks {
        let stats = task.await?;
        total.latencies.extend(stats.latencies);
        total.exhausted += stats.exhausted;
        total.failed += stats.failed;
    }
    let elapsed = started.elapsed();

    let report = SimulationReport {
        pool: config.pool.name.clone(),
        workers: sim.workers,
        requests: sim.workers * sim.iterations,
        acquired: total.latencies.len(),
        exhausted: total.exhausted,
        failed: total.failed,
        initial_capacity: config.pool.initial_capacity,
        final_capacity: pool.max_pool_size(),
        ceiling: config.strategy.ceiling,
        connections_created: created.load(Ordering::Relaxed),
        elapsed_ms: elapsed.as_millis(),
        latency: summarize(total.latencies),
        histograms: registry.snapshots(),
    };

    tracing::info!(
        acquired = report.acquired,
        exhausted = report.exhausted,
        final_capacity = report.final_capacity,
        elapsed_ms = report.elapsed_ms as u64,
        "Simulation finished"
    );
    Ok(report)
}

fn run_worker(
    worker: usize,
    pool: &AdaptivePool<BoundedPool<SimConnection>>,
    iterations: usize,
    hold: RangeInclusive<u64>,
) -> WorkerStats {
    let mut stats = WorkerStats::default();
    let mut rng = rand::thread_rng();
    let label = format!("worker-{worker}");

    for _ in 0..iterations {
        let ctx = RequestContext::new().with_label(label.clone());
        let attempt_started = Instant::now();
        match pool.acquire(&ctx) {
            Ok(lease) => {
                stats.latencies.push(attempt_started.elapsed());
                thread::sleep(Duration::from_millis(rng.gen_range(hold.clone())));
                tracing::trace!(worker, connection = lease.id, "Released connection");
            }
            Err(AcquireError::Exhausted(cause)) => {
                tracing::debug!(worker, cause = %cause, "Acquire exhausted");
                stats.exhausted += 1;
            }
            Err(e) => {
                tracing::warn!(worker, error = %e, "Acquire failed");
                stats.failed += 1;
            }
        }
    }
    stats
}

fn percentile(sorted: &[Duration], p: f64) -> f64 {
    let index = ((sorted.len() as f64 * p) as usize).min(sorted.len() - 1);
    sorted[index].as_micros() as f64 / 1000.0
}

fn summarize(mut latencies: Vec<Duration>) -> LatencySummary {
    if latencies.is_empty() {
        return LatencySummary::default();
    }
    latencies.sort();
    LatencySummary {
        p50_ms: percentile(&latencies, 0.50),
        p95_ms: percentile(&latencies, 0.95),
        p99_ms: percentile(&latencies, 0.99),
        max_ms: percentile(&latencies, 1.0),
    }
}
