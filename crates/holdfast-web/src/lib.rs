//! Holdfast Server: HTTP composition of the resilience gates
//!
//! Thin adapters that wrap an inbound axum handler so the circuit breaker
//! and rate limiter gate every request: breaker-open answers 500 with the
//! breaker's error text, a rate-limit denial answers 429 with
//! `"rate limit exceeded"`. Plus the small router/serve wiring the demo
//! binary uses.

pub mod middleware;
pub mod server;

pub use middleware::{breaker_gate, limiter_gate, Gates};
pub use server::{router, run_server, ServeError};

use std::time::Duration;

/// Configuration for the demo service
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address, e.g. `127.0.0.1:8080`
    pub addr: String,
    /// Breaker: failures before the circuit opens
    pub failure_threshold: u32,
    /// Breaker: how long the circuit stays open
    pub cooldown: Duration,
    /// Limiter: sustained admission rate (requests/second)
    pub rate: f64,
    /// Limiter: burst capacity
    pub burst: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8080".to_string(),
            failure_threshold: 5,
            cooldown: Duration::from_secs(30),
            rate: 50.0,
            burst: 100,
        }
    }
}
