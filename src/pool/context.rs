//! Per-call acquisition request context.

use std::time::Duration;
use uuid::Uuid;

/// Caller-specific overrides for a single acquisition.
///
/// Created by the caller for one `acquire` call and never mutated afterwards;
/// adapters and strategies only read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    id: Uuid,
    wait_budget: Option<Duration>,
    label: Option<String>,
}

impl RequestContext {
    /// Create a context with a fresh request id and no overrides.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            wait_budget: None,
            label: None,
        }
    }

    /// Override how long one attempt may wait for a resource.
    pub fn with_wait_budget(mut self, budget: Duration) -> Self {
        self.wait_budget = Some(budget);
        self
    }

    /// Attach a caller label, carried into log fields.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn wait_budget(&self) -> Option<Duration> {
        self.wait_budget
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
