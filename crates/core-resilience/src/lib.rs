//! Holdfast Core Resilience: pure-logic admission and failure-tolerance gates
//!
//! # Overview
//!
//! Building blocks meant to be composed underneath network-facing services
//! to bound concurrent work, shed load, and tolerate transient failures:
//!
//! - **Circuit Breaker**: stops calling a failing dependency for a cooldown
//!   period after repeated failures
//! - **Rate Limiter**: non-blocking token-bucket admission control
//! - **Retry**: bounded attempts with exponential backoff and cancellation
//! - **Worker Pool**: bounded FIFO queue drained by a single worker task
//!
//! # Key Principles
//!
//! This crate is **pure logic** with zero knowledge of:
//! - HTTP frameworks or wire protocols
//! - Process lifecycle (see `holdfast-core-lifecycle`)
//! - Application-specific concerns
//!
//! The breaker and limiter are synchronous, never-suspending gates safe to
//! call from latency-sensitive paths; the retry executor and worker pool are
//! the only components that suspend, and only at their documented wait
//! points.
//!
//! # Usage Example
//!
//! ```no_run
//! use holdfast_core_resilience::{
//!     CircuitBreaker, CircuitBreakerConfig, GuardError, RetryPolicy,
//! };
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), GuardError> {
//! let breaker = CircuitBreaker::new(CircuitBreakerConfig {
//!     failure_threshold: 5,
//!     cooldown: Duration::from_secs(30),
//! });
//! let policy = RetryPolicy::default();
//! let cancel = CancellationToken::new();
//!
//! // Retry around the breaker: the breaker sheds, the policy retries.
//! let value = policy.run(&cancel, || {
//!     breaker.execute(|| async {
//!         // Potentially failing call
//!         Ok::<_, GuardError>(42)
//!     })
//! }).await?;
//! # Ok(())
//! # }
//! ```

pub mod circuit_breaker;
pub mod error;
pub mod rate_limiter;
pub mod retry;
pub mod worker_pool;

// Re-export main types for convenience
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
pub use error::GuardError;
pub use rate_limiter::RateLimiter;
pub use retry::RetryPolicy;
pub use worker_pool::WorkerPool;

#[cfg(feature = "governor-impl")]
pub use rate_limiter::governor_impl::GovernorLimiter;

/// Prelude module for convenient imports
///
/// # Example
/// ```
/// use holdfast_core_resilience::prelude::*;
/// ```
pub mod prelude {
    pub use super::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
    pub use super::error::GuardError;
    pub use super::rate_limiter::RateLimiter;
    pub use super::retry::RetryPolicy;
    pub use super::worker_pool::WorkerPool;
}
