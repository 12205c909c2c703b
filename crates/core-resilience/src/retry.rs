//! Bounded-attempt retry with exponential backoff and cancellation
//!
//! A [`RetryPolicy`] is immutable once constructed and carries no shared
//! state across calls. [`RetryPolicy::run`] retries an operation up to
//! `max_attempts` times, sleeping `base_delay * 2^attempt` between attempts
//! (attempt is 0-based, so the default 1s base gives 1s, 2s, 4s, ...).
//!
//! `base_delay` *seeds* the exponential curve rather than being a fixed
//! per-attempt delay: configuring it scales the whole schedule. There is no
//! jitter and no per-attempt timeout — the only external control is the
//! cancellation token, which is consulted during backoff waits.

use crate::error::GuardError;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Retry schedule: bounded attempts with exponential backoff
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    /// 3 attempts, 1 second base delay (1s, 2s between attempts)
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with explicit attempts and base delay
    ///
    /// `max_attempts` is clamped to at least 1.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Override the attempt bound
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Override the backoff seed
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Maximum number of invocations of the operation
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before retrying after the given 0-based failed attempt
    pub fn backoff(&self, attempt: u32) -> Duration {
        // Saturate rather than overflow for absurd attempt counts.
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Run `op` under this policy
    ///
    /// Success short-circuits the remaining attempts. After a failure the
    /// executor waits for the backoff delay or for `cancel` to fire,
    /// whichever comes first; cancellation aborts immediately with
    /// [`GuardError::Cancelled`], discarding the operation's own error.
    /// Once attempts are exhausted, the *last* operation error is returned
    /// verbatim.
    ///
    /// Side-effect idempotence across attempts is the operation's own
    /// obligation.
    pub async fn run<F, Fut, T>(&self, cancel: &CancellationToken, mut op: F) -> Result<T, GuardError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GuardError>>,
    {
        let mut last_err = GuardError::operation("retry ran zero attempts");

        for attempt in 0..self.max_attempts {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => last_err = e,
            }

            // No wait after the final attempt.
            if attempt + 1 < self.max_attempts {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(GuardError::Cancelled),
                    _ = tokio::time::sleep(self.backoff(attempt)) => {}
                }
            }
        }

        Err(last_err)
    }
}
