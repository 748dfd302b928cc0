//! Shared fakes for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use adaptive_pool::observability::MetricsRegistry;
use adaptive_pool::strategy::Configuration;
use adaptive_pool::{AcquireError, BoxError, PoolAdapter, RequestContext};
use thiserror::Error;

/// Cause attached to every scripted timeout; `attempt` is the 0-based attempt index.
#[derive(Debug, Error)]
#[error("root cause of attempt {attempt}")]
pub struct RootCause {
    pub attempt: usize,
}

/// What one scripted attempt does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeed,
    TimeOut,
    Fail,
}

/// Resource handed out by [`ScriptedPool`].
#[derive(Debug, PartialEq, Eq)]
pub struct Connection {
    pub attempt: usize,
    pub capacity: usize,
}

type Script = Box<dyn Fn(usize, usize) -> Outcome + Send + Sync>;

/// Pool adapter whose attempts follow a script of `(attempt, capacity) -> Outcome`.
///
/// Records every setter call and the address of every timeout cause it raises.
pub struct ScriptedPool {
    capacity: AtomicUsize,
    honour_setter: bool,
    attempts: AtomicUsize,
    setter_calls: Mutex<Vec<usize>>,
    cause_addrs: Mutex<Vec<usize>>,
    script: Script,
}

impl ScriptedPool {
    pub fn new<F>(initial: usize, script: F) -> Self
    where
        F: Fn(usize, usize) -> Outcome + Send + Sync + 'static,
    {
        Self {
            capacity: AtomicUsize::new(initial),
            honour_setter: true,
            attempts: AtomicUsize::new(0),
            setter_calls: Mutex::new(Vec::new()),
            cause_addrs: Mutex::new(Vec::new()),
            script: Box::new(script),
        }
    }

    /// Keep reporting the initial capacity whatever the setter is given.
    pub fn ignoring_setter(mut self) -> Self {
        self.honour_setter = false;
        self
    }

    pub fn always_succeeds(initial: usize) -> Self {
        Self::new(initial, |_, _| Outcome::Succeed)
    }

    pub fn always_times_out(initial: usize) -> Self {
        Self::new(initial, |_, _| Outcome::TimeOut)
    }

    pub fn times_out_first(initial: usize, timeouts: usize) -> Self {
        Self::new(initial, move |attempt, _| {
            if attempt < timeouts {
                Outcome::TimeOut
            } else {
                Outcome::Succeed
            }
        })
    }

    pub fn succeeds_at_capacity(initial: usize, needed: usize) -> Self {
        Self::new(initial, move |_, capacity| {
            if capacity >= needed {
                Outcome::Succeed
            } else {
                Outcome::TimeOut
            }
        })
    }

    pub fn setter_calls(&self) -> Vec<usize> {
        self.setter_calls.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Heap address of the most recent timeout cause.
    pub fn last_cause_addr(&self) -> Option<usize> {
        self.cause_addrs.lock().unwrap().last().copied()
    }
}

impl PoolAdapter for ScriptedPool {
    type Resource = Connection;

    fn max_pool_size(&self) -> usize {
        self.capacity.load(Ordering::SeqCst)
    }

    fn set_max_pool_size(&self, size: usize) {
        self.setter_calls.lock().unwrap().push(size);
        if self.honour_setter {
            self.capacity.store(size, Ordering::SeqCst);
        }
    }

    fn acquire(&self, _ctx: &RequestContext) -> Result<Connection, AcquireError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        let capacity = self.max_pool_size();
        match (self.script)(attempt, capacity) {
            Outcome::Succeed => Ok(Connection { attempt, capacity }),
            Outcome::TimeOut => {
                let cause: BoxError = Box::new(RootCause { attempt });
                self.cause_addrs.lock().unwrap().push(cause_addr(&cause));
                Err(AcquireError::Timeout(cause))
            }
            Outcome::Fail => Err(AcquireError::other(format!("driver failure on attempt {attempt}"))),
        }
    }
}

/// Heap address of a boxed cause, for identity checks.
pub fn cause_addr(cause: &BoxError) -> usize {
    &**cause as *const (dyn std::error::Error + Send + Sync) as *const () as usize
}

/// Wire a pool and a fresh registry into a configuration.
pub fn wire(pool: ScriptedPool) -> (Configuration<ScriptedPool>, Arc<ScriptedPool>, Arc<MetricsRegistry>) {
    let pool = Arc::new(pool);
    let registry = Arc::new(MetricsRegistry::new());
    let config = Configuration::new("scripted", pool.clone(), registry.clone());
    (config, pool, registry)
}

/// Recorded values of a series, empty when it was never resolved.
pub fn observed(registry: &MetricsRegistry, name: &str) -> Vec<u64> {
    registry.get(name).map(|h| h.values()).unwrap_or_default()
}
