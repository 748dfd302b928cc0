//! In-process bounded resource pool.
//!
//! # Responsibilities
//! - Hand out at most `capacity` resources at a time
//! - Block acquirers until a slot frees up or their wait budget elapses
//! - Reuse returned resources (LIFO) before creating new ones
//! - Allow capacity changes at runtime
//!
//! # Design Decisions
//! - Mutex + Condvar; the lock only guards counters and the idle stack
//! - Resources are created outside the lock
//! - Leases are RAII guards that return the resource on drop

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::error::{AcquireError, BoxError};
use crate::pool::{PoolAdapter, RequestContext};

type Factory<R> = Box<dyn Fn() -> Result<R, BoxError> + Send + Sync>;

/// Cause attached to the timeout signal raised by [`BoundedPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no resource available after {waited:?} (capacity {capacity})")]
pub struct WaitTimeout {
    /// How long the attempt waited.
    pub waited: Duration,
    /// Capacity observed when the attempt gave up.
    pub capacity: usize,
}

#[derive(Debug)]
struct State<R> {
    capacity: usize,
    leased: usize,
    idle: Vec<R>,
}

struct Shared<R> {
    state: Mutex<State<R>>,
    available: Condvar,
    factory: Factory<R>,
    acquire_timeout: Duration,
}

impl<R> Shared<R> {
    fn lock(&self) -> MutexGuard<'_, State<R>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release(&self, resource: Option<R>) {
        let mut state = self.lock();
        state.leased = state.leased.saturating_sub(1);
        if let Some(resource) = resource {
            if state.idle.len() + state.leased < state.capacity {
                state.idle.push(resource);
            }
        }
        drop(state);
        self.available.notify_one();
    }
}

/// A resizable, blocking pool of resources produced by a factory.
pub struct BoundedPool<R> {
    shared: Arc<Shared<R>>,
}

impl<R> BoundedPool<R> {
    /// Create a pool with the given capacity and default per-attempt wait budget.
    pub fn new<F>(capacity: usize, acquire_timeout: Duration, factory: F) -> Self
    where
        F: Fn() -> Result<R, BoxError> + Send + Sync + 'static,
    {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    capacity,
                    leased: 0,
                    idle: Vec::new(),
                }),
                available: Condvar::new(),
                factory: Box::new(factory),
                acquire_timeout,
            }),
        }
    }

    /// Number of resources currently handed out.
    pub fn leased(&self) -> usize {
        self.shared.lock().leased
    }

    /// Number of idle resources kept for reuse.
    pub fn idle(&self) -> usize {
        self.shared.lock().idle.len()
    }

    /// Default wait budget for one attempt.
    pub fn acquire_timeout(&self) -> Duration {
        self.shared.acquire_timeout
    }
}

impl<R> fmt::Debug for BoundedPool<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("BoundedPool")
            .field("capacity", &state.capacity)
            .field("leased", &state.leased)
            .field("idle", &state.idle.len())
            .field("acquire_timeout", &self.shared.acquire_timeout)
            .finish()
    }
}

impl<R: Send + 'static> PoolAdapter for BoundedPool<R> {
    type Resource = Lease<R>;

    fn max_pool_size(&self) -> usize {
        self.shared.lock().capacity
    }

    fn set_max_pool_size(&self, size: usize) {
        let mut state = self.shared.lock();
        state.capacity = size;
        let keep = size.saturating_sub(state.leased);
        state.idle.truncate(keep);
        drop(state);
        self.shared.available.notify_all();
    }

    fn acquire(&self, ctx: &RequestContext) -> Result<Lease<R>, AcquireError> {
        let budget = ctx.wait_budget().unwrap_or(self.shared.acquire_timeout);
        let started = Instant::now();

        let mut state = self.shared.lock();
        while state.leased >= state.capacity {
            let elapsed = started.elapsed();
            if elapsed >= budget {
                return Err(AcquireError::timeout(WaitTimeout {
                    waited: elapsed,
                    capacity: state.capacity,
                }));
            }
            state = self
                .shared
                .available
                .wait_timeout(state, budget - elapsed)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        state.leased += 1;
        let reused = state.idle.pop();
        drop(state);

        let resource = match reused {
            Some(resource) => resource,
            None => match (self.shared.factory)() {
                Ok(resource) => resource,
                Err(e) => {
                    self.shared.release(None);
                    return Err(AcquireError::Other(e));
                }
            },
        };

        Ok(Lease {
            resource: Some(resource),
            pool: self.shared.clone(),
        })
    }
}

/// A resource leased from a [`BoundedPool`]; returned to the pool on drop.
pub struct Lease<R> {
    resource: Option<R>,
    pool: Arc<Shared<R>>,
}

impl<R> Lease<R> {
    /// Drop the resource instead of returning it for reuse.
    pub fn discard(mut self) {
        self.resource = None;
    }
}

impl<R> Deref for Lease<R> {
    type Target = R;
    fn deref(&self) -> &R {
        self.resource.as_ref().expect("lease holds a resource until dropped")
    }
}

impl<R> DerefMut for Lease<R> {
    fn deref_mut(&mut self) -> &mut R {
        self.resource.as_mut().expect("lease holds a resource until dropped")
    }
}

impl<R: fmt::Debug> fmt::Debug for Lease<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Lease").field(&self.resource).finish()
    }
}

impl<R> Drop for Lease<R> {
    fn drop(&mut self) {
        self.pool.release(self.resource.take());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::thread;

    fn counting_pool(capacity: usize, timeout_ms: u64) -> (BoundedPool<u32>, Arc<AtomicU32>) {
        let created = Arc::new(AtomicU32::new(0));
        let c = created.clone();
        let pool = BoundedPool::new(capacity, Duration::from_millis(timeout_ms), move || {
            Ok(c.fetch_add(1, Ordering::SeqCst))
        });
        (pool, created)
    }

    #[test]
    fn test_acquire_up_to_capacity_then_timeout() {
        let (pool, _) = counting_pool(2, 20);
        let ctx = RequestContext::new();
        let a = pool.acquire(&ctx).unwrap();
        let b = pool.acquire(&ctx).unwrap();
        assert_ne!(*a, *b);
        assert_eq!(pool.leased(), 2);

        let err = pool.acquire(&ctx).unwrap_err();
        assert!(err.is_timeout());
        let cause = err.cause().downcast_ref::<WaitTimeout>().unwrap();
        assert_eq!(cause.capacity, 2);
        assert!(cause.waited >= Duration::from_millis(20));
    }

    #[test]
    fn test_returned_resources_are_reused() {
        let (pool, created) = counting_pool(1, 20);
        let ctx = RequestContext::new();
        let first = *pool.acquire(&ctx).unwrap();
        let second = *pool.acquire(&ctx).unwrap();
        assert_eq!(first, second);
        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn test_discarded_lease_is_not_reused() {
        let (pool, created) = counting_pool(1, 20);
        let ctx = RequestContext::new();
        pool.acquire(&ctx).unwrap().discard();
        assert_eq!(pool.leased(), 0);
        pool.acquire(&ctx).unwrap();
        assert_eq!(created.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_growth_wakes_waiter() {
        let (pool, _) = counting_pool(1, 2_000);
        let pool = Arc::new(pool);
        let held = pool.acquire(&RequestContext::new()).unwrap();

        let p = pool.clone();
        let waiter = thread::spawn(move || p.acquire(&RequestContext::new()).map(|l| *l));
        thread::sleep(Duration::from_millis(30));
        pool.set_max_pool_size(2);

        assert!(waiter.join().unwrap().is_ok());
        drop(held);
    }

    #[test]
    fn test_shrink_below_leased_waits_for_returns() {
        let (pool, created) = counting_pool(2, 20);
        let ctx = RequestContext::new();
        let a = pool.acquire(&ctx).unwrap();
        let b = pool.acquire(&ctx).unwrap();

        pool.set_max_pool_size(1);
        assert_eq!(pool.max_pool_size(), 1);
        drop(a);
        assert_eq!(pool.leased(), 1);
        // over capacity: the returned resource is not kept
        assert_eq!(pool.idle(), 0);
        assert!(pool.acquire(&ctx).unwrap_err().is_timeout());

        drop(b);
        assert_eq!(pool.idle(), 1);
        assert!(pool.acquire(&ctx).is_ok());
        assert_eq!(created.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_context_budget_overrides_default() {
        let (pool, _) = counting_pool(0, 5_000);
        let ctx = RequestContext::new().with_wait_budget(Duration::from_millis(10));
        let started = Instant::now();
        assert!(pool.acquire(&ctx).unwrap_err().is_timeout());
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_factory_failure_is_not_a_timeout() {
        let pool: BoundedPool<u32> =
            BoundedPool::new(1, Duration::from_millis(10), || Err("refused".into()));
        let err = pool.acquire(&RequestContext::new()).unwrap_err();
        assert!(matches!(err, AcquireError::Other(_)));
        assert_eq!(pool.leased(), 0);
    }
}
