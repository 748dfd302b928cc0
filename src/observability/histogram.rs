//! Histogram recorders and the in-process metrics registry.
//!
//! # Responsibilities
//! - Define the `Histogram` and `Metrics` seams consumed by strategies
//! - Provide an idempotent, thread-safe registry of named series
//! - Keep cheap summary statistics plus a window of recent samples
//! - Optionally mirror every observation into the `metrics` facade

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use dashmap::DashMap;
use serde::Serialize;

/// Number of most recent samples kept per series.
pub const SAMPLE_WINDOW: usize = 4096;

/// Append-only recorder of numeric observations under one series.
pub trait Histogram: Send + Sync {
    fn update(&self, value: u64);
}

/// Resolves named histograms. Resolving the same name twice must yield the same series.
pub trait Metrics: Send + Sync {
    fn histogram(&self, name: &str) -> Arc<dyn Histogram>;
}

/// Point-in-time view of a recorded series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramSnapshot {
    pub name: String,
    pub count: u64,
    pub sum: u64,
    pub min: Option<u64>,
    pub max: Option<u64>,
    pub mean: Option<f64>,
}

#[derive(Debug, Default)]
struct Series {
    count: u64,
    sum: u64,
    min: Option<u64>,
    max: Option<u64>,
    recent: VecDeque<u64>,
}

/// Histogram that keeps its observations in memory.
pub struct RecordingHistogram {
    name: String,
    series: Mutex<Series>,
    mirror: Option<::metrics::Histogram>,
}

impl RecordingHistogram {
    fn new(name: &str, mirror: bool) -> Self {
        Self {
            name: name.to_string(),
            series: Mutex::new(Series::default()),
            mirror: mirror.then(|| crate::observability::metrics::facade_histogram(name)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Series> {
        self.series.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Recent observations in arrival order (bounded by [`SAMPLE_WINDOW`]).
    pub fn values(&self) -> Vec<u64> {
        self.lock().recent.iter().copied().collect()
    }

    /// How many times `value` appears among the recent observations.
    pub fn occurrences(&self, value: u64) -> usize {
        self.lock().recent.iter().filter(|v| **v == value).count()
    }

    pub fn snapshot(&self) -> HistogramSnapshot {
        let series = self.lock();
        HistogramSnapshot {
            name: self.name.clone(),
            count: series.count,
            sum: series.sum,
            min: series.min,
            max: series.max,
            mean: (series.count > 0).then(|| series.sum as f64 / series.count as f64),
        }
    }
}

impl fmt::Debug for RecordingHistogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingHistogram")
            .field("name", &self.name)
            .field("series", &*self.lock())
            .field("mirrored", &self.mirror.is_some())
            .finish()
    }
}

impl Histogram for RecordingHistogram {
    fn update(&self, value: u64) {
        {
            let mut series = self.lock();
            series.count += 1;
            series.sum = series.sum.saturating_add(value);
            series.min = Some(series.min.map_or(value, |m| m.min(value)));
            series.max = Some(series.max.map_or(value, |m| m.max(value)));
            if series.recent.len() == SAMPLE_WINDOW {
                series.recent.pop_front();
            }
            series.recent.push_back(value);
        }
        if let Some(mirror) = &self.mirror {
            mirror.record(value as f64);
        }
    }
}

/// Thread-safe registry of named [`RecordingHistogram`]s.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    series: DashMap<String, Arc<RecordingHistogram>>,
    mirror: bool,
}

impl MetricsRegistry {
    /// Create a registry that only records in memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry that also forwards observations to the `metrics` facade.
    pub fn mirrored() -> Self {
        Self {
            series: DashMap::new(),
            mirror: true,
        }
    }

    /// Resolve a series, creating it on first use.
    pub fn recording(&self, name: &str) -> Arc<RecordingHistogram> {
        if let Some(existing) = self.series.get(name) {
            return existing.value().clone();
        }
        self.series
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(RecordingHistogram::new(name, self.mirror)))
            .value()
            .clone()
    }

    /// Look up a series without creating it.
    pub fn get(&self, name: &str) -> Option<Arc<RecordingHistogram>> {
        self.series.get(name).map(|r| r.value().clone())
    }

    /// Snapshots of every series, sorted by name.
    pub fn snapshots(&self) -> Vec<HistogramSnapshot> {
        let mut all: Vec<_> = self.series.iter().map(|r| r.value().snapshot()).collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }
}

impl Metrics for MetricsRegistry {
    fn histogram(&self, name: &str) -> Arc<dyn Histogram> {
        self.recording(name)
    }
}
