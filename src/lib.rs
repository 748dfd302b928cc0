//! Adaptive resource pool library.
//!
//! Decorates a bounded resource pool with acquisition strategies that react to
//! acquire timeouts, growing the pool up to a ceiling instead of failing fast.

pub mod config;
pub mod error;
pub mod observability;
pub mod pool;
pub mod simulation;
pub mod strategy;

pub use config::AppConfig;
pub use error::{AcquireError, BoxError};
pub use pool::{AdaptivePool, PoolAdapter, RequestContext};
pub use strategy::{AcquiringStrategy, Configuration, StrategyFactory};
