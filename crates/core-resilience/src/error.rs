//! Error types shared by the resilience gates

use thiserror::Error;

/// Errors produced (or carried) by the resilience primitives
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GuardError {
    /// Circuit breaker is open, rejecting calls until the cooldown elapses
    #[error("circuit breaker is open, rejecting calls")]
    CircuitOpen,

    /// Rate limiter denied admission
    #[error("rate limit exceeded")]
    RateLimitExceeded,

    /// Cancellation signal fired while waiting between retry attempts
    #[error("operation cancelled")]
    Cancelled,

    /// Work was submitted to a worker pool that has already stopped
    #[error("worker pool queue is closed")]
    QueueClosed,

    /// Generic operation failure carried through the gates unchanged
    #[error("operation failed: {0}")]
    Operation(String),
}

impl GuardError {
    /// Convenience constructor for operation failures
    pub fn operation(msg: impl Into<String>) -> Self {
        GuardError::Operation(msg.into())
    }

    /// Whether this error came from a gate rather than the wrapped operation
    ///
    /// Gate rejections are load-shedding decisions: the caller should back
    /// off or retry later, not treat them as a hard failure of the work
    /// itself.
    pub fn is_gate_rejection(&self) -> bool {
        matches!(
            self,
            GuardError::CircuitOpen | GuardError::RateLimitExceeded | GuardError::QueueClosed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_rejection_classification() {
        assert!(GuardError::CircuitOpen.is_gate_rejection());
        assert!(GuardError::RateLimitExceeded.is_gate_rejection());
        assert!(GuardError::QueueClosed.is_gate_rejection());
        assert!(!GuardError::Cancelled.is_gate_rejection());
        assert!(!GuardError::operation("boom").is_gate_rejection());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            GuardError::RateLimitExceeded.to_string(),
            "rate limit exceeded"
        );
        assert_eq!(
            GuardError::operation("dial tcp refused").to_string(),
            "operation failed: dial tcp refused"
        );
    }
}
