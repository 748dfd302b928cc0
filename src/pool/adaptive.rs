//! Decorated pool running a chain of acquiring strategies.
//!
//! # Responsibilities
//! - Build every strategy once, from its factory, at construction
//! - Run strategies in order until one hands out a resource
//! - Fall through on pool pressure, stop on unrelated failures

use std::fmt;
use std::sync::Arc;

use crate::error::AcquireError;
use crate::pool::{PoolAdapter, RequestContext};
use crate::strategy::{BoxedStrategy, Configuration, StrategyFactory};

/// A pool adapter decorated with acquisition strategies.
pub struct AdaptivePool<P: PoolAdapter> {
    config: Configuration<P>,
    strategies: Vec<BoxedStrategy<P>>,
}

impl<P: PoolAdapter> AdaptivePool<P> {
    /// Wire the strategies produced by `factories`, in order.
    pub fn new(config: Configuration<P>, factories: &[&dyn StrategyFactory<P>]) -> Self {
        let strategies = factories.iter().map(|f| f.new_instance(&config)).collect();
        Self { config, strategies }
    }

    pub fn config(&self) -> &Configuration<P> {
        &self.config
    }

    pub fn pool(&self) -> &Arc<P> {
        self.config.pool()
    }

    /// Current capacity of the decorated pool.
    pub fn max_pool_size(&self) -> usize {
        self.config.pool().max_pool_size()
    }

    /// Acquire a resource, letting each strategy mitigate a timeout in turn.
    pub fn acquire(&self, ctx: &RequestContext) -> Result<P::Resource, AcquireError> {
        if self.strategies.is_empty() {
            return match self.config.pool().acquire(ctx) {
                Err(AcquireError::Timeout(cause)) => Err(AcquireError::Exhausted(cause)),
                other => other,
            };
        }

        let mut last_cause = None;
        for (index, strategy) in self.strategies.iter().enumerate() {
            match strategy.acquire(ctx) {
                Ok(resource) => return Ok(resource),
                Err(AcquireError::Timeout(cause)) | Err(AcquireError::Exhausted(cause)) => {
                    tracing::debug!(
                        pool = %self.config.name(),
                        request_id = %ctx.id(),
                        strategy = index,
                        "Strategy gave up, trying next"
                    );
                    last_cause = Some(cause);
                }
                Err(e) => {
                    tracing::error!(
                        pool = %self.config.name(),
                        request_id = %ctx.id(),
                        error = %e,
                        "Acquire failed"
                    );
                    return Err(e);
                }
            }
        }

        tracing::warn!(
            pool = %self.config.name(),
            request_id = %ctx.id(),
            label = ctx.label().unwrap_or("-"),
            "All strategies exhausted"
        );
        Err(AcquireError::Exhausted(
            last_cause.unwrap_or_else(|| "no strategy produced a resource".into()),
        ))
    }
}

impl<P: PoolAdapter> fmt::Debug for AdaptivePool<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdaptivePool")
            .field("config", &self.config)
            .field("strategies", &self.strategies.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::MetricsRegistry;
    use crate::strategy::{IncrementPoolOnTimeoutFactory, RetryOnTimeoutFactory};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Succeeds only once capacity reaches `threshold`; counts attempts.
    struct Threshold {
        capacity: AtomicUsize,
        threshold: usize,
        attempts: AtomicUsize,
        broken: bool,
    }

    impl PoolAdapter for Threshold {
        type Resource = usize;

        fn max_pool_size(&self) -> usize {
            self.capacity.load(Ordering::SeqCst)
        }

        fn set_max_pool_size(&self, size: usize) {
            self.capacity.store(size, Ordering::SeqCst);
        }

        fn acquire(&self, _ctx: &RequestContext) -> Result<usize, AcquireError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if self.broken {
                return Err(AcquireError::other("connection refused"));
            }
            let capacity = self.max_pool_size();
            if capacity >= self.threshold {
                Ok(capacity)
            } else {
                Err(AcquireError::timeout(format!("busy at {capacity}")))
            }
        }
    }

    fn config(initial: usize, threshold: usize, broken: bool) -> Configuration<Threshold> {
        let pool = Arc::new(Threshold {
            capacity: AtomicUsize::new(initial),
            threshold,
            attempts: AtomicUsize::new(0),
            broken,
        });
        Configuration::new("chain", pool, Arc::new(MetricsRegistry::new()))
    }

    #[test]
    fn test_without_strategies_timeout_is_exhaustion() {
        let pool = AdaptivePool::new(config(1, 2, false), &[]);
        let err = pool.acquire(&RequestContext::new()).unwrap_err();
        assert!(err.is_exhausted());
        assert_eq!(err.cause().to_string(), "busy at 1");
    }

    #[test]
    fn test_first_strategy_mitigates() {
        let grow = IncrementPoolOnTimeoutFactory::new(5);
        let pool = AdaptivePool::new(config(1, 3, false), &[&grow]);
        assert_eq!(pool.acquire(&RequestContext::new()).unwrap(), 3);
        assert_eq!(pool.max_pool_size(), 3);
    }

    #[test]
    fn test_falls_through_to_next_strategy() {
        let grow = IncrementPoolOnTimeoutFactory::new(2);
        let retry = RetryOnTimeoutFactory::new(2);
        let pool = AdaptivePool::new(config(1, 10, false), &[&grow, &retry]);
        let err = pool.acquire(&RequestContext::new()).unwrap_err();
        assert!(err.is_exhausted());
        assert_eq!(err.cause().to_string(), "busy at 2");
        // two attempts growing 1 → 2, then three from the retry strategy
        assert_eq!(pool.pool().attempts.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_unrelated_failure_stops_chain() {
        let grow = IncrementPoolOnTimeoutFactory::new(5);
        let retry = RetryOnTimeoutFactory::new(2);
        let pool = AdaptivePool::new(config(1, 1, true), &[&grow, &retry]);
        let err = pool.acquire(&RequestContext::new()).unwrap_err();
        assert!(matches!(err, AcquireError::Other(_)));
        assert_eq!(pool.pool().attempts.load(Ordering::SeqCst), 1);
        assert_eq!(pool.max_pool_size(), 1);
    }
}
