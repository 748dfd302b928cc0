//! Pool adapter subsystem.
//!
//! # Data Flow
//! ```text
//! caller → AdaptivePool::acquire(ctx)          (adaptive.rs)
//!     → strategy chain (crate::strategy)
//!     → PoolAdapter::acquire(ctx)              (one bounded attempt)
//!         - Ok(resource)
//!         - Err(Timeout)  → strategy may grow capacity and retry
//!         - Err(other)    → propagated untouched
//! ```
//!
//! # Design Decisions
//! - Adapters own capacity; strategies only read and set it
//! - The wait budget of one attempt belongs to the adapter
//! - `bounded.rs` is an in-process adapter used by the simulator and tests

pub mod adaptive;
pub mod bounded;
pub mod context;

pub use adaptive::AdaptivePool;
pub use bounded::{BoundedPool, Lease, WaitTimeout};
pub use context::RequestContext;

use crate::error::AcquireError;

/// Uniform capacity/acquire interface over a concrete resource pool.
///
/// `max_pool_size` and `set_max_pool_size` must be cheap and non-blocking.
/// `acquire` is the only call allowed to block the caller.
pub trait PoolAdapter: Send + Sync {
    /// Handle handed out to callers.
    type Resource;

    /// Current capacity of the underlying pool.
    fn max_pool_size(&self) -> usize;

    /// Set a new capacity. May be called concurrently.
    fn set_max_pool_size(&self, size: usize);

    /// Make one bounded attempt to obtain a resource.
    ///
    /// Fails with [`AcquireError::Timeout`] when nothing became available in time.
    fn acquire(&self, ctx: &RequestContext) -> Result<Self::Resource, AcquireError>;
}
