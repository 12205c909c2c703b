//! Gate integration tests: the primitives composed the way services use them

use holdfast_core_resilience::{
    CircuitBreaker, CircuitBreakerConfig, GuardError, RateLimiter, RetryPolicy, WorkerPool,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// The canonical single-token bucket: one admission, then a full second of
/// denial, then one admission again.
#[tokio::test]
async fn test_rate_one_burst_one_over_a_real_second() {
    let limiter = RateLimiter::new(1.0, 1);

    assert!(limiter.allow());
    assert!(!limiter.allow());

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(limiter.allow());
}

/// Retry wrapped around a breaker: the breaker sheds calls while open, the
/// retry policy keeps knocking until the cooldown admits a probe.
#[tokio::test]
async fn test_retry_around_breaker_recovers_after_cooldown() {
    let breaker = Arc::new(CircuitBreaker::new(CircuitBreakerConfig {
        failure_threshold: 2,
        cooldown: Duration::from_millis(30),
    }));
    let downstream_calls = Arc::new(AtomicU32::new(0));

    // Trip the breaker with two failing calls.
    for _ in 0..2 {
        let _: Result<(), GuardError> = breaker
            .execute(|| async { Err(GuardError::operation("downstream down")) })
            .await;
    }
    assert!(breaker.is_open());

    // 4 attempts, 20ms backoff seed: attempt 1 hits the open breaker, a
    // later attempt lands after the 30ms cooldown and succeeds.
    let policy = RetryPolicy::new(4, Duration::from_millis(20));
    let cancel = CancellationToken::new();

    let breaker_in_op = breaker.clone();
    let calls_in_op = downstream_calls.clone();
    let result = policy
        .run(&cancel, move || {
            let breaker = breaker_in_op.clone();
            let calls = calls_in_op.clone();
            async move {
                breaker
                    .execute(|| async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, GuardError>("recovered")
                    })
                    .await
            }
        })
        .await;

    assert_eq!(result, Ok("recovered"));
    assert!(!breaker.is_open());
    assert_eq!(
        downstream_calls.load(Ordering::SeqCst),
        1,
        "downstream was called while the breaker was open"
    );
}

/// A limited producer fanning deferred work into the pool: admitted work all
/// executes, in order, before stop.
#[tokio::test]
async fn test_limiter_feeding_worker_pool() {
    // Refill is negligible within the test, so only the burst admits.
    let limiter = RateLimiter::new(0.001, 8);
    let pool = WorkerPool::new(8);
    let executed = Arc::new(AtomicU32::new(0));

    let mut admitted = 0u32;
    for _ in 0..32 {
        if limiter.allow() {
            admitted += 1;
            let executed = executed.clone();
            pool.submit(async move {
                executed.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();
        }
    }
    assert_eq!(admitted, 8, "burst capacity should bound admissions");

    // Drain: an empty sentinel job observed means everything before it ran.
    let (tx, rx) = tokio::sync::oneshot::channel();
    pool.submit(async move {
        let _ = tx.send(());
    })
    .await
    .unwrap();
    rx.await.unwrap();

    assert_eq!(executed.load(Ordering::SeqCst), 8);
    pool.stop().await;
}
