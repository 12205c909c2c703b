//! Holdfast Core Lifecycle: process lifecycle orchestration
//!
//! # Overview
//!
//! The pieces a service bootstrap needs to start N long-running operations
//! and block until the first failure or a full drain:
//!
//! - **Orchestrator**: launches tasks, aggregates their errors, and yields a
//!   single completion signal (first error wins; close is idempotent)
//! - **ReadinessGraph**: explicit DAG of named nodes with readiness probes,
//!   started in dependency order on the orchestrator
//!
//! The orchestrator has shutdown *observation* authority only: it never
//! cancels tasks. Cancellation, if wanted, is threaded through the tasks
//! themselves by the registrant.
//!
//! # Usage Example
//!
//! ```no_run
//! use holdfast_core_lifecycle::{Completion, LifecycleError, Orchestrator};
//!
//! # async fn example() {
//! let orch = Orchestrator::new();
//!
//! orch.spawn(async {
//!     // e.g. serve HTTP until the listener dies
//!     Ok(())
//! });
//!
//! match orch.done().await {
//!     Completion::Clean => {}
//!     Completion::Faulted(e) => eprintln!("fatal: {e}"),
//! }
//! # }
//! ```

pub mod error;
pub mod orchestrator;
pub mod readiness;

// Re-export main types for convenience
pub use error::LifecycleError;
pub use orchestrator::{Completion, Orchestrator};
pub use readiness::{ReadinessConfig, ReadinessGraph, ReadinessProbe};
