//! Orchestrator: supervise long-running tasks and report the first failure
//!
//! The orchestrator launches tasks, counts them in flight, and produces a
//! single completion signal: the first task error, or a clean close once
//! every task has finished after [`Orchestrator::done`] (or an explicit
//! [`Orchestrator::close`]). Errors after the first are appended to an
//! aggregation list — reporting a late failure never blocks the reporting
//! task, and any number of observers may consume the signal.
//!
//! The orchestrator only aggregates completion. It has no cancellation
//! authority: a task error does not cancel siblings, and callers that want
//! that behavior must thread their own cancellation signal into each task.

use crate::error::LifecycleError;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, error};

/// Terminal outcome of one orchestrated cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Every task finished without error (or the cycle was closed explicitly)
    Clean,
    /// At least one task failed; this is the first error observed
    Faulted(LifecycleError),
}

impl Completion {
    /// The first error, if the cycle faulted
    pub fn err(&self) -> Option<&LifecycleError> {
        match self {
            Completion::Clean => None,
            Completion::Faulted(e) => Some(e),
        }
    }
}

// Aggregate cycle state. `closed` flips false -> true exactly once; the
// signal fires in the same critical section, so repeated close/done/error
// paths cannot double-fire.
#[derive(Debug)]
struct Cycle {
    pending: usize,
    draining: bool,
    errors: Vec<LifecycleError>,
    closed: bool,
}

#[derive(Debug)]
struct Inner {
    cycle: Mutex<Cycle>,
    signal: watch::Sender<Option<Completion>>,
}

impl Inner {
    // Must be called with the cycle lock held.
    fn fire_locked(&self, cycle: &mut Cycle, completion: Completion) {
        if !cycle.closed {
            cycle.closed = true;
            self.signal.send_replace(Some(completion));
        }
    }

    fn complete(&self, result: Result<(), LifecycleError>) {
        let mut cycle = self.cycle.lock().expect("cycle lock poisoned");
        cycle.pending -= 1;

        if let Err(e) = result {
            error!(error = %e, "lifecycle task failed");
            cycle.errors.push(e.clone());
            if cycle.errors.len() == 1 {
                self.fire_locked(&mut cycle, Completion::Faulted(e));
            }
        }

        if cycle.draining && cycle.pending == 0 {
            debug!("all lifecycle tasks drained");
            self.fire_locked(&mut cycle, Completion::Clean);
        }
    }
}

/// Supervises a set of long-running tasks and yields one completion signal
///
/// # Example
/// ```no_run
/// use holdfast_core_lifecycle::{Completion, LifecycleError, Orchestrator};
///
/// # async fn example() {
/// let orch = Orchestrator::new();
///
/// orch.spawn(async {
///     // Long-running work
///     Ok(())
/// });
/// orch.spawn(async {
///     Err(LifecycleError::task("listener died"))
/// });
///
/// match orch.done().await {
///     Completion::Clean => {}
///     Completion::Faulted(e) => eprintln!("first failure: {e}"),
/// }
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Orchestrator {
    /// Create an orchestrator with no registered tasks
    pub fn new() -> Self {
        let (signal, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                cycle: Mutex::new(Cycle {
                    pending: 0,
                    draining: false,
                    errors: Vec::new(),
                    closed: false,
                }),
                signal,
            }),
        }
    }

    /// Register one task and launch it concurrently
    ///
    /// The task's error, if it is the first among all tasks, fires the
    /// completion signal. Later errors are recorded in [`Self::errors`]
    /// without blocking anything. Tasks spawned after the signal has fired
    /// are still launched and tracked, but can no longer affect the signal.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = Result<(), LifecycleError>> + Send + 'static,
    {
        {
            let mut cycle = self.inner.cycle.lock().expect("cycle lock poisoned");
            cycle.pending += 1;
        }
        let inner = self.inner.clone();
        tokio::spawn(async move {
            let result = task.await;
            inner.complete(result);
        });
    }

    /// Await the completion signal: the first task error or the clean close
    pub async fn wait(&self) -> Completion {
        let mut rx = self.inner.signal.subscribe();
        loop {
            if let Some(completion) = rx.borrow_and_update().clone() {
                return completion;
            }
            if rx.changed().await.is_err() {
                return Completion::Clean;
            }
        }
    }

    /// Begin draining: once every registered task has completed, the signal
    /// closes clean unless an error fired first. Resolves like [`Self::wait`].
    pub async fn done(&self) -> Completion {
        {
            let mut cycle = self.inner.cycle.lock().expect("cycle lock poisoned");
            cycle.draining = true;
            if cycle.pending == 0 {
                self.inner.fire_locked(&mut cycle, Completion::Clean);
            }
        }
        self.wait().await
    }

    /// Idempotent terminal transition
    ///
    /// Closes the completion signal exactly once regardless of how many
    /// callers race here; a no-op if the signal already fired. Running tasks
    /// are not cancelled.
    pub fn close(&self) {
        let mut cycle = self.inner.cycle.lock().expect("cycle lock poisoned");
        self.inner.fire_locked(&mut cycle, Completion::Clean);
    }

    /// Whether the completion signal has fired
    pub fn is_closed(&self) -> bool {
        self.inner.cycle.lock().expect("cycle lock poisoned").closed
    }

    /// Number of registered tasks still in flight
    pub fn pending(&self) -> usize {
        self.inner.cycle.lock().expect("cycle lock poisoned").pending
    }

    /// Every task error recorded so far, in wall-clock arrival order
    pub fn errors(&self) -> Vec<LifecycleError> {
        self.inner
            .cycle
            .lock()
            .expect("cycle lock poisoned")
            .errors
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_first_error_wins() {
        let orch = Orchestrator::new();

        orch.spawn(async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(())
        });
        orch.spawn(async { Err(LifecycleError::task("task #2 exploded")) });
        orch.spawn(async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(())
        });

        let completion = orch.wait().await;
        assert_eq!(
            completion,
            Completion::Faulted(LifecycleError::task("task #2 exploded"))
        );

        // The signal is repeatable for any number of observers.
        assert_eq!(orch.wait().await, completion);
    }

    #[tokio::test]
    async fn test_done_closes_clean_after_drain() {
        let orch = Orchestrator::new();

        for _ in 0..3 {
            orch.spawn(async {
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok(())
            });
        }

        assert_eq!(orch.done().await, Completion::Clean);
        assert_eq!(orch.pending(), 0);
    }

    #[tokio::test]
    async fn test_done_with_no_tasks_is_clean() {
        let orch = Orchestrator::new();
        assert_eq!(orch.done().await, Completion::Clean);
    }

    #[tokio::test]
    async fn test_close_is_idempotent_under_concurrency() {
        let orch = Orchestrator::new();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let orch = orch.clone();
            handles.push(tokio::spawn(async move { orch.close() }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(orch.is_closed());
        assert_eq!(orch.wait().await, Completion::Clean);

        // Closing an already-closed orchestrator stays a no-op.
        orch.close();
        assert_eq!(orch.wait().await, Completion::Clean);
    }

    #[tokio::test]
    async fn test_late_errors_are_aggregated_not_blocking() {
        let orch = Orchestrator::new();

        orch.spawn(async { Err(LifecycleError::task("first")) });
        let first = orch.wait().await;
        assert_eq!(first, Completion::Faulted(LifecycleError::task("first")));

        // A second failing task after delivery must still complete.
        orch.spawn(async { Err(LifecycleError::task("second")) });
        while orch.pending() > 0 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        assert_eq!(
            orch.errors(),
            vec![
                LifecycleError::task("first"),
                LifecycleError::task("second")
            ]
        );
        // Signal still holds the first error.
        assert_eq!(orch.wait().await, first);
    }

    #[tokio::test]
    async fn test_error_beats_drain() {
        let orch = Orchestrator::new();

        orch.spawn(async { Err(LifecycleError::task("boom")) });
        orch.spawn(async { Ok(()) });

        let completion = orch.done().await;
        assert_eq!(
            completion,
            Completion::Faulted(LifecycleError::task("boom"))
        );
    }
}
