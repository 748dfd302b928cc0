//! Acquisition strategies.
//!
//! # Data Flow
//! ```text
//! Configuration (pool adapter + metrics provider)
//!     → StrategyFactory::new_instance (resolves histograms once)
//!     → AcquiringStrategy::acquire(ctx), called concurrently:
//!         - increment.rs: grow capacity on timeout, up to a ceiling
//!         - retry.rs: retry a bounded number of times, capacity untouched
//! ```
//!
//! # Design Decisions
//! - Strategies only react to `AcquireError::Timeout`; other errors pass through
//! - Each variant holds the collaborators it needs; no shared base state
//! - Factories are plain values, so a pool can chain several variants

pub mod backoff;
pub mod increment;
pub mod retry;

pub use increment::{IncrementPoolOnTimeout, IncrementPoolOnTimeoutFactory};
pub use retry::{RetryOnTimeout, RetryOnTimeoutFactory};

use std::fmt;
use std::sync::Arc;

use crate::error::AcquireError;
use crate::observability::Metrics;
use crate::pool::{PoolAdapter, RequestContext};

/// Obtains a resource, possibly mitigating pool pressure along the way.
pub trait AcquiringStrategy: Send + Sync {
    type Resource;

    fn acquire(&self, ctx: &RequestContext) -> Result<Self::Resource, AcquireError>;
}

/// Strategy object handing out the resources of pool adapter `P`.
pub type BoxedStrategy<P> = Box<dyn AcquiringStrategy<Resource = <P as PoolAdapter>::Resource>>;

/// Builds strategy instances bound to one [`Configuration`].
pub trait StrategyFactory<P: PoolAdapter> {
    fn new_instance(&self, config: &Configuration<P>) -> BoxedStrategy<P>;
}

/// The collaborators one decorated pool is wired with.
pub struct Configuration<P> {
    name: String,
    pool: Arc<P>,
    metrics: Arc<dyn Metrics>,
}

impl<P: PoolAdapter> Configuration<P> {
    pub fn new(name: impl Into<String>, pool: Arc<P>, metrics: Arc<dyn Metrics>) -> Self {
        Self {
            name: name.into(),
            pool,
            metrics,
        }
    }

    /// Pool name, used in log fields.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pool(&self) -> &Arc<P> {
        &self.pool
    }

    pub fn metrics(&self) -> &Arc<dyn Metrics> {
        &self.metrics
    }
}

impl<P> Clone for Configuration<P> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            pool: self.pool.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

impl<P> fmt::Debug for Configuration<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration").field("name", &self.name).finish_non_exhaustive()
    }
}
