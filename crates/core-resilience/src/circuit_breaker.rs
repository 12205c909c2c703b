//! Circuit breaker: fail fast when a downstream dependency keeps failing
//!
//! The breaker counts failures and, once `failure_threshold` is reached,
//! rejects every call for `cooldown`. After the cooldown elapses the breaker
//! closes optimistically: the failure counter resets *before* the next call
//! completes, so several tasks racing into the recovery window may all be
//! admitted. That is a deliberate simplification — there is no single-probe
//! half-open gate.
//!
//! The whole admit decision sits under one `std::sync::Mutex`, which is never
//! held across an `.await`. Checking the gate never suspends the caller.

use crate::error::GuardError;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Configuration for circuit breaker behavior
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Number of cumulative failures (since the last reset) before opening
    pub failure_threshold: u32,
    /// How long the breaker stays open after the last recorded failure
    pub cooldown: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown: Duration::from_secs(30),
        }
    }
}

#[derive(Debug)]
struct BreakerState {
    failures: u32,
    last_failure: Option<Instant>,
    open: bool,
}

impl BreakerState {
    fn new() -> Self {
        Self {
            failures: 0,
            last_failure: None,
            open: false,
        }
    }
}

/// Failure-counting gate with timed recovery
///
/// # Example
/// ```no_run
/// use holdfast_core_resilience::{CircuitBreaker, CircuitBreakerConfig, GuardError};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), GuardError> {
/// let breaker = CircuitBreaker::new(CircuitBreakerConfig {
///     failure_threshold: 5,
///     cooldown: Duration::from_secs(30),
/// });
///
/// let value = breaker.execute(|| async {
///     // Call the flaky dependency here
///     Ok::<_, GuardError>(42)
/// }).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    config: Arc<CircuitBreakerConfig>,
    state: Arc<Mutex<BreakerState>>,
}

impl CircuitBreaker {
    /// Create a new circuit breaker with the given configuration
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config: Arc::new(config),
            state: Arc::new(Mutex::new(BreakerState::new())),
        }
    }

    /// Create a new circuit breaker with default configuration
    pub fn new_default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }

    /// Check the gate without running anything
    ///
    /// Returns `Err(CircuitOpen)` while the breaker is open and the cooldown
    /// has not elapsed since the last failure. If the cooldown has elapsed,
    /// the breaker closes, the failure counter resets to zero, and the call
    /// is admitted.
    pub fn admit(&self) -> Result<(), GuardError> {
        let mut state = self.state.lock().expect("breaker lock poisoned");

        if !state.open {
            return Ok(());
        }

        let elapsed = state
            .last_failure
            .map(|t| t.elapsed())
            .unwrap_or(Duration::MAX);

        if elapsed >= self.config.cooldown {
            // Cooldown over: close optimistically and admit the caller.
            state.open = false;
            state.failures = 0;
            debug!(elapsed_ms = elapsed.as_millis() as u64, "circuit breaker closed after cooldown");
            Ok(())
        } else {
            Err(GuardError::CircuitOpen)
        }
    }

    /// Record one failure against the breaker
    ///
    /// Opens the circuit once the cumulative count reaches the threshold.
    pub fn record_failure(&self) {
        let mut state = self.state.lock().expect("breaker lock poisoned");
        state.failures += 1;
        state.last_failure = Some(Instant::now());
        if state.failures >= self.config.failure_threshold && !state.open {
            state.open = true;
            warn!(
                failures = state.failures,
                cooldown_ms = self.config.cooldown.as_millis() as u64,
                "circuit breaker opened"
            );
        }
    }

    /// Execute an operation behind the gate
    ///
    /// If the breaker is open the operation is never invoked. On failure the
    /// error is recorded for breaker accounting and forwarded to the caller
    /// unchanged. Success leaves breaker state untouched; the failure counter
    /// only resets on the cooldown-expiry path. No retries happen here —
    /// compose with [`RetryPolicy`](crate::RetryPolicy) if retries are wanted.
    pub async fn execute<F, Fut, T>(&self, op: F) -> Result<T, GuardError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, GuardError>>,
    {
        self.admit()?;

        match op().await {
            Ok(value) => Ok(value),
            Err(e) => {
                self.record_failure();
                Err(e)
            }
        }
    }

    /// Whether the circuit is currently open
    pub fn is_open(&self) -> bool {
        self.state.lock().expect("breaker lock poisoned").open
    }

    /// Current cumulative failure count since the last reset
    pub fn failure_count(&self) -> u32 {
        self.state.lock().expect("breaker lock poisoned").failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(threshold: u32, cooldown: Duration) -> CircuitBreaker {
        CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: threshold,
            cooldown,
        })
    }

    #[tokio::test]
    async fn test_opens_exactly_at_threshold() {
        let breaker = breaker(3, Duration::from_secs(60));

        for i in 0..3u32 {
            assert!(!breaker.is_open(), "open after only {} failures", i);
            let result: Result<(), GuardError> = breaker
                .execute(|| async { Err(GuardError::operation("boom")) })
                .await;
            assert_eq!(result, Err(GuardError::operation("boom")));
        }

        assert!(breaker.is_open());
        assert_eq!(breaker.failure_count(), 3);
    }

    #[tokio::test]
    async fn test_open_breaker_rejects_without_invoking() {
        let breaker = breaker(1, Duration::from_secs(60));

        let _: Result<(), GuardError> = breaker
            .execute(|| async { Err(GuardError::operation("boom")) })
            .await;
        assert!(breaker.is_open());

        let mut invoked = false;
        let result: Result<(), GuardError> = breaker
            .execute(|| {
                invoked = true;
                async { Ok(()) }
            })
            .await;

        assert_eq!(result, Err(GuardError::CircuitOpen));
        assert!(!invoked, "operation ran while the breaker was open");
    }

    #[tokio::test]
    async fn test_cooldown_expiry_admits_and_resets_failures() {
        let breaker = breaker(2, Duration::from_millis(50));

        for _ in 0..2 {
            let _: Result<(), GuardError> = breaker
                .execute(|| async { Err(GuardError::operation("boom")) })
                .await;
        }
        assert!(breaker.is_open());

        tokio::time::sleep(Duration::from_millis(60)).await;

        let result = breaker.execute(|| async { Ok::<_, GuardError>(7) }).await;
        assert_eq!(result, Ok(7));
        assert!(!breaker.is_open());
        assert_eq!(breaker.failure_count(), 0);
    }

    #[tokio::test]
    async fn test_success_leaves_state_untouched() {
        let breaker = breaker(3, Duration::from_secs(60));

        let _: Result<(), GuardError> = breaker
            .execute(|| async { Err(GuardError::operation("boom")) })
            .await;
        assert_eq!(breaker.failure_count(), 1);

        let _ = breaker.execute(|| async { Ok::<_, GuardError>(()) }).await;
        assert_eq!(breaker.failure_count(), 1, "success must not reset failures");
    }

    #[tokio::test]
    async fn test_operation_error_is_forwarded_verbatim() {
        let breaker = breaker(5, Duration::from_secs(60));

        let result: Result<(), GuardError> = breaker
            .execute(|| async { Err(GuardError::operation("dial tcp refused")) })
            .await;

        assert_eq!(result, Err(GuardError::operation("dial tcp refused")));
        assert_eq!(breaker.failure_count(), 1);
    }
}
