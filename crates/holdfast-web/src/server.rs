//! Axum server setup for the demo service

use crate::middleware::{breaker_gate, limiter_gate, Gates};
use crate::ServerConfig;
use axum::{middleware, routing::get, Json, Router};
use holdfast_core_resilience::{CircuitBreaker, CircuitBreakerConfig, RateLimiter};
use serde::Serialize;
use thiserror::Error;
use tower_http::trace::TraceLayer;

/// Errors from the serve path
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("server io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Health payload
#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    breaker_open: bool,
}

async fn healthz(axum::extract::State(gates): axum::extract::State<Gates>) -> Json<Health> {
    Json(Health {
        status: "ok",
        breaker_open: gates.breaker.is_open(),
    })
}

async fn index() -> &'static str {
    "holdfast demo service\n"
}

/// Build the demo router with both gates installed
///
/// The limiter sits outermost: it is the cheaper check, so abusive traffic
/// is shed before it ever touches the breaker. Callers composing their own
/// router may stack the gates in either order.
pub fn router(gates: Gates) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/healthz", get(healthz))
        .layer(middleware::from_fn_with_state(gates.clone(), breaker_gate))
        .layer(middleware::from_fn_with_state(gates.clone(), limiter_gate))
        .layer(TraceLayer::new_for_http())
        .with_state(gates)
}

/// Bind and serve the demo service until the listener dies
pub async fn run_server(config: ServerConfig) -> Result<(), ServeError> {
    let gates = Gates::new(
        CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: config.failure_threshold,
            cooldown: config.cooldown,
        }),
        RateLimiter::new(config.rate, config.burst),
    );

    let app = router(gates);
    let listener = tokio::net::TcpListener::bind(&config.addr)
        .await
        .map_err(|source| ServeError::Bind {
            addr: config.addr.clone(),
            source,
        })?;

    tracing::info!(addr = %config.addr, "holdfast demo service listening");
    axum::serve(listener, app).await?;
    Ok(())
}
