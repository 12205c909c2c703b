//! Error types for lifecycle orchestration

use std::time::Duration;
use thiserror::Error;

/// Errors reported by lifecycle tasks and the readiness graph
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// A supervised task failed
    #[error("task failed: {0}")]
    Task(String),

    /// A registered node names a prerequisite that was never registered
    #[error("node '{node}' depends on unknown node '{dependency}'")]
    UnknownDependency { node: String, dependency: String },

    /// A node name was registered twice
    #[error("node '{0}' registered more than once")]
    DuplicateNode(String),

    /// The prerequisite graph contains a cycle
    #[error("dependency cycle among nodes: {0}")]
    DependencyCycle(String),

    /// Prerequisite probes did not all report ready before the deadline
    #[error("readiness timeout after {0:?}; still waiting on: {1}")]
    ReadinessTimeout(Duration, String),
}

impl LifecycleError {
    /// Convenience constructor for task failures
    pub fn task(msg: impl Into<String>) -> Self {
        LifecycleError::Task(msg.into())
    }
}
