//! Readiness graph: start tasks once their prerequisites report ready
//!
//! Each registered node carries a name, the names of its prerequisites, a
//! readiness probe, and the lifecycle task to launch. [`ReadinessGraph::start_all`]
//! evaluates the graph topologically: a node starts (is spawned on the
//! orchestrator) once every prerequisite has been started *and* every
//! prerequisite's probe reports ready. Probes are polled at a configurable
//! interval until an overall timeout.
//!
//! Unknown prerequisites and cycles are rejected up front, before any start
//! action runs.

use crate::error::LifecycleError;
use crate::orchestrator::Orchestrator;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Readiness check for a started node
///
/// Implemented for any plain `Fn() -> bool` closure, so callers can pass
/// `|| db.is_connected()` directly.
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    /// Whether this node is ready for its dependents to start
    async fn is_ready(&self) -> bool;
}

#[async_trait]
impl<F> ReadinessProbe for F
where
    F: Fn() -> bool + Send + Sync,
{
    async fn is_ready(&self) -> bool {
        (self)()
    }
}

/// Polling parameters for [`ReadinessGraph::start_all`]
#[derive(Debug, Clone)]
pub struct ReadinessConfig {
    /// How often prerequisite probes are re-polled
    pub poll_interval: Duration,
    /// Overall deadline for the whole graph to start
    pub timeout: Duration,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(50),
            timeout: Duration::from_secs(30),
        }
    }
}

type NodeTask = Pin<Box<dyn Future<Output = Result<(), LifecycleError>> + Send + 'static>>;

struct Node {
    name: String,
    after: Vec<String>,
    probe: Arc<dyn ReadinessProbe>,
    task: NodeTask,
}

/// Explicit DAG of named nodes with readiness probes and start actions
///
/// # Example
/// ```no_run
/// use holdfast_core_lifecycle::{Orchestrator, ReadinessConfig, ReadinessGraph};
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// # async fn example() -> Result<(), holdfast_core_lifecycle::LifecycleError> {
/// let db_up = Arc::new(AtomicBool::new(false));
/// let probe_flag = db_up.clone();
///
/// let mut graph = ReadinessGraph::new(ReadinessConfig::default());
/// graph.register("database", &[], move || probe_flag.load(Ordering::SeqCst), async move {
///     db_up.store(true, Ordering::SeqCst);
///     Ok(())
/// })?;
/// graph.register("api", &["database"], || true, async { Ok(()) })?;
///
/// let orch = Orchestrator::new();
/// graph.start_all(&orch).await?;
/// # Ok(())
/// # }
/// ```
pub struct ReadinessGraph {
    config: ReadinessConfig,
    nodes: Vec<Node>,
}

impl ReadinessGraph {
    /// Create an empty graph
    pub fn new(config: ReadinessConfig) -> Self {
        Self {
            config,
            nodes: Vec::new(),
        }
    }

    /// Register a node
    ///
    /// `after` names the prerequisites; `probe` reports this node's own
    /// readiness to its dependents; `task` is spawned on the orchestrator
    /// once the prerequisites are ready.
    pub fn register<P, F>(
        &mut self,
        name: &str,
        after: &[&str],
        probe: P,
        task: F,
    ) -> Result<(), LifecycleError>
    where
        P: ReadinessProbe + 'static,
        F: Future<Output = Result<(), LifecycleError>> + Send + 'static,
    {
        if self.nodes.iter().any(|n| n.name == name) {
            return Err(LifecycleError::DuplicateNode(name.to_string()));
        }
        self.nodes.push(Node {
            name: name.to_string(),
            after: after.iter().map(|s| s.to_string()).collect(),
            probe: Arc::new(probe),
            task: Box::pin(task),
        });
        Ok(())
    }

    /// Validate the graph structure: every prerequisite exists and the
    /// dependency relation is acyclic
    fn validate(&self) -> Result<(), LifecycleError> {
        let known: HashSet<&str> = self.nodes.iter().map(|n| n.name.as_str()).collect();

        for node in &self.nodes {
            for dep in &node.after {
                if !known.contains(dep.as_str()) {
                    return Err(LifecycleError::UnknownDependency {
                        node: node.name.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
        }

        // Kahn's algorithm over the name graph; leftovers form a cycle.
        let mut in_degree: HashMap<&str, usize> = self
            .nodes
            .iter()
            .map(|n| (n.name.as_str(), n.after.len()))
            .collect();
        let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
        for node in &self.nodes {
            for dep in &node.after {
                dependents
                    .entry(dep.as_str())
                    .or_default()
                    .push(node.name.as_str());
            }
        }

        let mut queue: Vec<&str> = in_degree
            .iter()
            .filter(|(_, d)| **d == 0)
            .map(|(n, _)| *n)
            .collect();
        let mut resolved = 0usize;
        while let Some(name) = queue.pop() {
            resolved += 1;
            for dependent in dependents.get(name).into_iter().flatten() {
                let d = in_degree.get_mut(dependent).expect("dependent registered");
                *d -= 1;
                if *d == 0 {
                    queue.push(dependent);
                }
            }
        }

        if resolved != self.nodes.len() {
            let mut stuck: Vec<&str> = in_degree
                .iter()
                .filter(|(_, d)| **d > 0)
                .map(|(n, _)| *n)
                .collect();
            stuck.sort_unstable();
            return Err(LifecycleError::DependencyCycle(stuck.join(", ")));
        }

        Ok(())
    }

    /// Start every node in dependency order, spawning each task on `orch`
    ///
    /// Consumes the graph. Polls prerequisite probes every
    /// `poll_interval` and gives up with [`LifecycleError::ReadinessTimeout`]
    /// once `timeout` has passed with nodes still unstarted.
    pub async fn start_all(self, orch: &Orchestrator) -> Result<(), LifecycleError> {
        self.validate()?;

        let deadline = Instant::now() + self.config.timeout;
        let mut probes: HashMap<String, Arc<dyn ReadinessProbe>> = HashMap::new();
        let mut started: HashSet<String> = HashSet::new();
        let mut remaining = self.nodes;

        while !remaining.is_empty() {
            let mut waiting = Vec::with_capacity(remaining.len());

            for node in remaining {
                let mut eligible = true;
                for dep in &node.after {
                    if !started.contains(dep) {
                        eligible = false;
                        break;
                    }
                    let probe = probes.get(dep).expect("started node has a probe");
                    // A probe that never resolves must not stall the graph
                    // past the deadline; a timed-out poll counts as not ready.
                    let ready = tokio::time::timeout_at(deadline, probe.is_ready())
                        .await
                        .unwrap_or(false);
                    if !ready {
                        eligible = false;
                        break;
                    }
                }

                if eligible {
                    info!(node = %node.name, "starting lifecycle node");
                    probes.insert(node.name.clone(), node.probe);
                    started.insert(node.name);
                    orch.spawn(node.task);
                } else {
                    waiting.push(node);
                }
            }

            remaining = waiting;
            if remaining.is_empty() {
                break;
            }

            if Instant::now() >= deadline {
                let mut stuck: Vec<String> =
                    remaining.into_iter().map(|n| n.name).collect();
                stuck.sort_unstable();
                return Err(LifecycleError::ReadinessTimeout(
                    self.config.timeout,
                    stuck.join(", "),
                ));
            }

            debug!(waiting = remaining.len(), "prerequisites not ready, polling again");
            tokio::time::sleep(self.config.poll_interval).await;
        }

        Ok(())
    }
}
