//! Retry-on-timeout strategy.
//!
//! Retries a timed-out attempt a bounded number of times without touching
//! capacity, optionally sleeping a jittered exponential backoff in between.

use std::sync::Arc;
use std::thread;

use crate::error::AcquireError;
use crate::observability::Histogram;
use crate::pool::{PoolAdapter, RequestContext};
use crate::strategy::backoff::retry_delay;
use crate::strategy::{AcquiringStrategy, BoxedStrategy, Configuration, StrategyFactory};

/// Retries a call needed, recorded once per call that retried at all.
pub const RETRY_ATTEMPTS_HISTOGRAM: &str = "retry-attempts";

/// Retries timed-out attempts up to a fixed count.
pub struct RetryOnTimeout<P> {
    pool_name: String,
    pool: Arc<P>,
    retry_attempts: Arc<dyn Histogram>,
    max_retries: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
}

impl<P: PoolAdapter> AcquiringStrategy for RetryOnTimeout<P> {
    type Resource = P::Resource;

    fn acquire(&self, ctx: &RequestContext) -> Result<P::Resource, AcquireError> {
        let mut retries = 0u32;
        loop {
            match self.pool.acquire(ctx) {
                Ok(resource) => {
                    if retries > 0 {
                        self.retry_attempts.update(u64::from(retries));
                    }
                    return Ok(resource);
                }
                Err(AcquireError::Timeout(cause)) => {
                    if retries >= self.max_retries {
                        if retries > 0 {
                            self.retry_attempts.update(u64::from(retries));
                        }
                        tracing::warn!(
                            pool = %self.pool_name,
                            request_id = %ctx.id(),
                            retries,
                            "Pool exhausted after retries"
                        );
                        return Err(AcquireError::Exhausted(cause));
                    }
                    retries += 1;
                    let delay = retry_delay(retries, self.base_delay_ms, self.max_delay_ms);
                    tracing::debug!(
                        pool = %self.pool_name,
                        request_id = %ctx.id(),
                        retry = retries,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying after acquire timeout"
                    );
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Binds a retry count and backoff; produces [`RetryOnTimeout`] instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryOnTimeoutFactory {
    max_retries: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
}

impl RetryOnTimeoutFactory {
    /// Retry immediately, up to `max_retries` times.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay_ms: 0,
            max_delay_ms: 0,
        }
    }

    pub fn with_backoff(mut self, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self.max_delay_ms = max_delay_ms;
        self
    }

    pub fn build<P: PoolAdapter>(&self, config: &Configuration<P>) -> RetryOnTimeout<P> {
        RetryOnTimeout {
            pool_name: config.name().to_string(),
            pool: config.pool().clone(),
            retry_attempts: config.metrics().histogram(RETRY_ATTEMPTS_HISTOGRAM),
            max_retries: self.max_retries,
            base_delay_ms: self.base_delay_ms,
            max_delay_ms: self.max_delay_ms,
        }
    }
}

impl<P: PoolAdapter + 'static> StrategyFactory<P> for RetryOnTimeoutFactory {
    fn new_instance(&self, config: &Configuration<P>) -> BoxedStrategy<P> {
        Box::new(self.build(config))
    }
}
