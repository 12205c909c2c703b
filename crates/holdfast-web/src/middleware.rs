//! Request gates: circuit breaker and rate limiter as axum middleware
//!
//! Both gates are independent layers and commute for correctness; stack the
//! cheaper one outermost if cost matters. A breaker-open condition answers
//! 500 with the breaker's error text; a rate-limit denial answers 429 with a
//! fixed message.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use holdfast_core_resilience::{CircuitBreaker, GuardError, RateLimiter};
use std::sync::Arc;
use tracing::debug;

/// Shared gate state handed to the middleware functions
#[derive(Clone)]
pub struct Gates {
    pub breaker: Arc<CircuitBreaker>,
    pub limiter: Arc<RateLimiter>,
}

impl Gates {
    pub fn new(breaker: CircuitBreaker, limiter: RateLimiter) -> Self {
        Self {
            breaker: Arc::new(breaker),
            limiter: Arc::new(limiter),
        }
    }
}

/// Circuit-breaker gate
///
/// Rejects with 500 while the breaker is open, without running the
/// downstream handler. A downstream 5xx response is recorded as a breaker
/// failure; anything else leaves breaker state untouched.
pub async fn breaker_gate(State(gates): State<Gates>, req: Request, next: Next) -> Response {
    if let Err(e) = gates.breaker.admit() {
        debug!(path = %req.uri().path(), "request rejected by circuit breaker");
        return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
    }

    let response = next.run(req).await;
    if response.status().is_server_error() {
        gates.breaker.record_failure();
    }
    response
}

/// Rate-limiter gate
///
/// Rejects with 429 when the token bucket is empty; never waits.
pub async fn limiter_gate(State(gates): State<Gates>, req: Request, next: Next) -> Response {
    if !gates.limiter.allow() {
        debug!(path = %req.uri().path(), "request rejected by rate limiter");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            GuardError::RateLimitExceeded.to_string(),
        )
            .into_response();
    }
    next.run(req).await
}
