//! Increment-on-timeout strategy.
//!
//! # Algorithm
//! ```text
//! size := pool.max_pool_size(); overflow := 0
//! loop:
//!     max-pool-size ← size
//!     acquire:
//!         Ok(r)          → return r
//!         Err(other)     → return other
//!         Err(Timeout c) → size + increment > ceiling → Exhausted(c)
//!                          otherwise, under the growth lock:
//!                              overflow += 1; size += increment
//!                              pool.set_max_pool_size(size)
//!                              overflow-pool-size ← overflow
//! ```
//!
//! # Concurrency
//! Growth is serialized per strategy instance. Inside the lock the adapter's
//! capacity is the compare-and-set basis: a caller that finds the pool already
//! larger than its local size adopts that size instead of growing again, so
//! concurrent callers never duplicate or lose an increment. Acquisition
//! attempts themselves never run under the lock.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::AcquireError;
use crate::observability::Histogram;
use crate::pool::{PoolAdapter, RequestContext};
use crate::strategy::{AcquiringStrategy, BoxedStrategy, Configuration, StrategyFactory};

/// Capacity visited by every acquisition attempt.
pub const MAX_POOL_SIZE_HISTOGRAM: &str = "max-pool-size";
/// Growth count within one acquisition, recorded once per growth.
pub const OVERFLOW_POOL_SIZE_HISTOGRAM: &str = "overflow-pool-size";

/// Outcome of one pass through the growth lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Growth {
    /// This caller raised capacity to the new size.
    Grown(usize),
    /// Another caller already raised capacity; continue from its size.
    Adopted(usize),
    /// No increment fits under the ceiling.
    AtCeiling,
}

/// Grows the pool by a fixed increment each time an attempt times out.
///
/// Growth is serialized by a lock owned by this instance, so exactly one
/// instance is expected per pool adapter. Share it between callers (as
/// [`AdaptivePool`](crate::pool::AdaptivePool) does) rather than building a
/// second one over the same adapter: two instances racing on one adapter can
/// both grow from the same observed size.
pub struct IncrementPoolOnTimeout<P> {
    pool_name: String,
    pool: Arc<P>,
    max_pool_size: Arc<dyn Histogram>,
    overflow_pool_size: Arc<dyn Histogram>,
    ceiling: usize,
    increment: usize,
    growth: Mutex<()>,
}

impl<P: PoolAdapter> IncrementPoolOnTimeout<P> {
    /// Highest capacity this strategy may request.
    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    pub fn increment(&self) -> usize {
        self.increment
    }

    fn next_size(&self, basis: usize) -> Option<usize> {
        basis
            .checked_add(self.increment)
            .filter(|next| *next <= self.ceiling)
    }

    fn grow(&self, size: usize, overflow: &mut usize) -> Growth {
        let _guard = self.growth.lock().unwrap_or_else(PoisonError::into_inner);

        let current = self.pool.max_pool_size();
        if current > size {
            return Growth::Adopted(current);
        }

        match self.next_size(size) {
            Some(next) => {
                *overflow += 1;
                self.pool.set_max_pool_size(next);
                self.overflow_pool_size.update(*overflow as u64);
                Growth::Grown(next)
            }
            None => Growth::AtCeiling,
        }
    }
}

impl<P: PoolAdapter> AcquiringStrategy for IncrementPoolOnTimeout<P> {
    type Resource = P::Resource;

    fn acquire(&self, ctx: &RequestContext) -> Result<P::Resource, AcquireError> {
        let mut size = self.pool.max_pool_size();
        let mut overflow = 0usize;

        loop {
            self.max_pool_size.update(size as u64);

            let cause = match self.pool.acquire(ctx) {
                Ok(resource) => return Ok(resource),
                Err(AcquireError::Timeout(cause)) => cause,
                Err(e) => return Err(e),
            };

            match self.grow(size, &mut overflow) {
                Growth::Grown(next) => {
                    tracing::debug!(
                        pool = %self.pool_name,
                        request_id = %ctx.id(),
                        from = size,
                        to = next,
                        overflow,
                        "Grew pool after acquire timeout"
                    );
                    size = next;
                }
                Growth::Adopted(current) => {
                    tracing::trace!(
                        pool = %self.pool_name,
                        request_id = %ctx.id(),
                        from = size,
                        to = current,
                        "Pool already grown by a concurrent caller"
                    );
                    size = current;
                }
                Growth::AtCeiling => {
                    tracing::warn!(
                        pool = %self.pool_name,
                        request_id = %ctx.id(),
                        size,
                        ceiling = self.ceiling,
                        overflow,
                        "Pool exhausted at growth ceiling"
                    );
                    return Err(AcquireError::Exhausted(cause));
                }
            }
        }
    }
}

/// Binds a ceiling and increment; produces [`IncrementPoolOnTimeout`] instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncrementPoolOnTimeoutFactory {
    ceiling: usize,
    increment: NonZeroUsize,
}

impl IncrementPoolOnTimeoutFactory {
    /// Growth by one up to `ceiling`.
    pub fn new(ceiling: usize) -> Self {
        Self {
            ceiling,
            increment: NonZeroUsize::MIN,
        }
    }

    pub fn with_increment(mut self, increment: NonZeroUsize) -> Self {
        self.increment = increment;
        self
    }

    /// Build a strategy wired to `config`. Resolves both histograms now.
    pub fn build<P: PoolAdapter>(&self, config: &Configuration<P>) -> IncrementPoolOnTimeout<P> {
        let metrics = config.metrics();
        IncrementPoolOnTimeout {
            pool_name: config.name().to_string(),
            pool: config.pool().clone(),
            max_pool_size: metrics.histogram(MAX_POOL_SIZE_HISTOGRAM),
            overflow_pool_size: metrics.histogram(OVERFLOW_POOL_SIZE_HISTOGRAM),
            ceiling: self.ceiling,
            increment: self.increment.get(),
            growth: Mutex::new(()),
        }
    }
}

impl<P: PoolAdapter + 'static> StrategyFactory<P> for IncrementPoolOnTimeoutFactory {
    fn new_instance(&self, config: &Configuration<P>) -> BoxedStrategy<P> {
        Box::new(self.build(config))
    }
}
