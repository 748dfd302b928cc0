//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::num::NonZeroUsize;
use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::strategy::{IncrementPoolOnTimeoutFactory, RetryOnTimeoutFactory};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// The decorated pool.
    pub pool: PoolConfig,

    /// Growth and retry strategies.
    pub strategy: StrategyConfig,

    /// Logging and metrics export.
    pub observability: ObservabilityConfig,

    /// Load generated by the simulation binary.
    pub simulation: SimulationConfig,
}

impl AppConfig {
    /// True when the first increment would already exceed the ceiling, so the
    /// pool keeps its initial capacity.
    pub fn growth_disabled(&self) -> bool {
        self.pool
            .initial_capacity
            .checked_add(self.strategy.increment)
            .map_or(true, |next| next > self.strategy.ceiling)
    }
}

/// Pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct PoolConfig {
    /// Pool name used in log fields.
    pub name: String,

    /// Capacity before any growth.
    pub initial_capacity: usize,

    /// How long one attempt waits for a resource, in milliseconds.
    pub acquire_timeout_ms: u64,
}

impl PoolConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            initial_capacity: 2,
            acquire_timeout_ms: 50,
        }
    }
}

/// Strategy configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct StrategyConfig {
    /// Highest capacity the pool may be grown to.
    pub ceiling: usize,

    /// Capacity added on each timeout.
    pub increment: usize,

    /// Retries after growth is exhausted (0 disables the retry strategy).
    pub retry_attempts: u32,

    /// Base retry backoff in milliseconds (0 = retry immediately).
    pub retry_base_delay_ms: u64,

    /// Maximum retry backoff in milliseconds.
    pub retry_max_delay_ms: u64,
}

impl StrategyConfig {
    /// Factory for the growth strategy. Validation guarantees a non-zero increment.
    pub fn increment_factory(&self) -> IncrementPoolOnTimeoutFactory {
        let factory = IncrementPoolOnTimeoutFactory::new(self.ceiling);
        match NonZeroUsize::new(self.increment) {
            Some(increment) => factory.with_increment(increment),
            None => factory,
        }
    }

    /// Factory for the retry strategy, if enabled.
    pub fn retry_factory(&self) -> Option<RetryOnTimeoutFactory> {
        (self.retry_attempts > 0).then(|| {
            RetryOnTimeoutFactory::new(self.retry_attempts)
                .with_backoff(self.retry_base_delay_ms, self.retry_max_delay_ms)
        })
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            ceiling: 10,
            increment: 1,
            retry_attempts: 0,
            retry_base_delay_ms: 0,
            retry_max_delay_ms: 1000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Simulated workload.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    /// Concurrent workers.
    pub workers: usize,

    /// Acquisitions per worker.
    pub iterations: usize,

    /// Shortest time a worker holds a resource, in milliseconds.
    pub hold_ms_min: u64,

    /// Longest time a worker holds a resource, in milliseconds.
    pub hold_ms_max: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            workers: 8,
            iterations: 50,
            hold_ms_min: 5,
            hold_ms_max: 40,
        }
    }
}
