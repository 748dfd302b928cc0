//! Error types shared by pool adapters and acquiring strategies.

use thiserror::Error;

/// A boxed, thread-safe error used as the cause of an acquisition failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while acquiring a pooled resource.
///
/// Only [`AcquireError::Timeout`] is mitigated by the strategies in this crate.
/// Every other variant passes through them untouched.
#[derive(Debug, Error)]
pub enum AcquireError {
    /// No resource became available within one attempt's wait budget.
    #[error("timed out waiting for a pooled resource")]
    Timeout(#[source] BoxError),

    /// The strategy ran out of mitigation; wraps the last timeout's cause.
    #[error("pool exhausted: no resource could be acquired")]
    Exhausted(#[source] BoxError),

    /// Any failure unrelated to pool pressure.
    #[error("pool failure: {0}")]
    Other(#[source] BoxError),
}

impl AcquireError {
    /// Wrap an arbitrary error as a timeout signal.
    pub fn timeout<E>(cause: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Timeout(cause.into())
    }

    /// Wrap an arbitrary error as an unrelated failure.
    pub fn other<E>(cause: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Other(cause.into())
    }

    /// True for the timeout signal.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// True for a terminal exhaustion raised by a strategy.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted(_))
    }

    /// Borrow the wrapped cause.
    pub fn cause(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        match self {
            Self::Timeout(cause) | Self::Exhausted(cause) | Self::Other(cause) => cause.as_ref(),
        }
    }

    /// Take back the exact cause object this error wraps.
    pub fn into_cause(self) -> BoxError {
        match self {
            Self::Timeout(cause) | Self::Exhausted(cause) | Self::Other(cause) => cause,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[derive(Debug, Error)]
    #[error("socket closed: {0}")]
    struct Closed(u32);

    #[test]
    fn test_source_is_wrapped_cause() {
        let err = AcquireError::Exhausted(Box::new(Closed(7)));
        let source = err.source().expect("exhaustion carries a cause");
        let closed = source.downcast_ref::<Closed>().expect("cause type preserved");
        assert_eq!(closed.0, 7);
    }

    #[test]
    fn test_kind_predicates() {
        assert!(AcquireError::timeout("slow").is_timeout());
        assert!(!AcquireError::other("broken").is_timeout());
        assert!(AcquireError::Exhausted("x".into()).is_exhausted());
    }

    #[test]
    fn test_error_display() {
        let err = AcquireError::other(Closed(3));
        assert_eq!(err.to_string(), "pool failure: socket closed: 3");
        assert_eq!(err.cause().to_string(), "socket closed: 3");
    }
}
