//! Token-bucket rate limiting for admission control
//!
//! Tokens accumulate at a sustained `rate` up to a `burst` capacity; every
//! admitted call consumes one. The refill happens lazily on each check, so
//! there is no background task. [`RateLimiter::allow`] is non-blocking and
//! O(1): callers that need to wait must poll or reject — the limiter never
//! queues.

use std::sync::Mutex;
use std::time::Instant;

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Non-blocking token-bucket admission gate
///
/// # Example
/// ```
/// use holdfast_core_resilience::RateLimiter;
///
/// // 100 requests/second sustained, bursts of up to 10
/// let limiter = RateLimiter::new(100.0, 10);
/// assert!(limiter.allow());
/// ```
#[derive(Debug)]
pub struct RateLimiter {
    /// Sustained refill rate in tokens per second
    rate: f64,
    /// Bucket capacity
    burst: u32,
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    /// Create a limiter with a sustained `rate` (tokens/second) and `burst`
    /// capacity. The bucket starts full.
    pub fn new(rate: f64, burst: u32) -> Self {
        Self {
            rate,
            burst,
            bucket: Mutex::new(Bucket {
                tokens: burst as f64,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Create a limiter allowing `requests_per_second` with an equal burst
    pub fn per_second(requests_per_second: u32) -> Self {
        Self::new(requests_per_second as f64, requests_per_second)
    }

    /// Try to admit one call
    ///
    /// Refills the bucket from the elapsed time since the last check, then
    /// consumes one token if available. Never blocks and never queues.
    pub fn allow(&self) -> bool {
        let mut bucket = self.bucket.lock().expect("limiter lock poisoned");

        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_refill);
        bucket.last_refill = now;

        bucket.tokens = (bucket.tokens + elapsed.as_secs_f64() * self.rate).min(self.burst as f64);

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Sustained rate in tokens per second
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Bucket capacity
    pub fn burst(&self) -> u32 {
        self.burst
    }
}

/// Governor-backed limiter with the same non-blocking gate shape
///
/// Enabled with the `governor-impl` feature when the lock-free generic-cell
/// implementation is preferred over the mutex-guarded bucket.
#[cfg(feature = "governor-impl")]
pub mod governor_impl {
    use crate::error::GuardError;
    use governor::{
        clock::DefaultClock,
        state::{InMemoryState, NotKeyed},
        Quota, RateLimiter as Governor,
    };
    use std::num::NonZeroU32;
    use std::time::Duration;

    /// Token-bucket limiter backed by the governor crate
    pub struct GovernorLimiter {
        inner: Governor<NotKeyed, InMemoryState, DefaultClock>,
    }

    impl GovernorLimiter {
        /// Create a limiter admitting `max_requests` per `period` with the
        /// given burst capacity
        pub fn new(max_requests: u32, period: Duration, burst: u32) -> Result<Self, GuardError> {
            let max_requests = NonZeroU32::new(max_requests)
                .ok_or_else(|| GuardError::operation("max_requests must be > 0"))?;
            let burst = NonZeroU32::new(burst)
                .ok_or_else(|| GuardError::operation("burst must be > 0"))?;

            let quota = Quota::with_period(period / max_requests.get())
                .ok_or_else(|| GuardError::operation("period must be > 0"))?
                .allow_burst(burst);

            Ok(Self {
                inner: Governor::direct(quota),
            })
        }

        /// Try to admit one call without waiting
        pub fn allow(&self) -> bool {
            self.inner.check().is_ok()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_single_token_bucket_admits_exactly_once() {
        let limiter = RateLimiter::new(1.0, 1);

        assert!(limiter.allow());
        assert!(!limiter.allow(), "second call with no elapsed time admitted");
    }

    #[test]
    fn test_refill_after_wait() {
        // 20 tokens/second: one token back after 50ms.
        let limiter = RateLimiter::new(20.0, 1);

        assert!(limiter.allow());
        assert!(!limiter.allow());

        std::thread::sleep(Duration::from_millis(60));
        assert!(limiter.allow());
    }

    #[test]
    fn test_burst_capacity() {
        let limiter = RateLimiter::new(1.0, 5);

        for i in 0..5 {
            assert!(limiter.allow(), "burst admission {} denied", i);
        }
        assert!(!limiter.allow());
    }

    #[test]
    fn test_bucket_never_exceeds_burst() {
        let limiter = RateLimiter::new(1000.0, 2);

        // Drain, then wait long enough to refill far past the cap.
        assert!(limiter.allow());
        assert!(limiter.allow());
        std::thread::sleep(Duration::from_millis(50));

        assert!(limiter.allow());
        assert!(limiter.allow());
        assert!(!limiter.allow(), "bucket refilled past burst capacity");
    }

    #[test]
    fn test_config_accessors() {
        let limiter = RateLimiter::per_second(100);
        assert_eq!(limiter.rate(), 100.0);
        assert_eq!(limiter.burst(), 100);
    }
}
