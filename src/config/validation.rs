//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - A ceiling below the initial capacity is valid; see `AppConfig::growth_disabled`

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::AppConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("strategy.increment must be at least 1")]
    ZeroIncrement,

    #[error("strategy.ceiling must be at least 1")]
    ZeroCeiling,

    #[error("pool.acquire_timeout_ms must be greater than 0")]
    ZeroAcquireTimeout,

    #[error("simulation.workers must be at least 1")]
    NoWorkers,

    #[error("simulation.hold_ms_min ({min}) exceeds hold_ms_max ({max})")]
    HoldRange { min: u64, max: u64 },

    #[error("observability.metrics_address is not a socket address: {0}")]
    MetricsAddress(String),
}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.strategy.increment == 0 {
        errors.push(ValidationError::ZeroIncrement);
    }
    if config.strategy.ceiling == 0 {
        errors.push(ValidationError::ZeroCeiling);
    }
    if config.pool.acquire_timeout_ms == 0 {
        errors.push(ValidationError::ZeroAcquireTimeout);
    }
    if config.simulation.workers == 0 {
        errors.push(ValidationError::NoWorkers);
    }
    if config.simulation.hold_ms_min > config.simulation.hold_ms_max {
        errors.push(ValidationError::HoldRange {
            min: config.simulation.hold_ms_min,
            max: config.simulation.hold_ms_max,
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
