//! Bounded worker pool: FIFO deferral of background jobs
//!
//! A pool owns a bounded queue of capacity `size` drained by exactly one
//! background task, so `size` bounds queue depth, not parallelism. Items
//! execute strictly in submission order and a slow item delays everything
//! behind it. [`WorkerPool::submit`] suspends the submitter while the queue
//! is full — backpressure, never a drop policy.
//!
//! Shutdown is best-effort, at-most-once: [`WorkerPool::stop`] lets the
//! in-flight item finish and discards everything still queued. Callers that
//! need at-least-once execution must not rely on this pool across shutdown.

use crate::error::GuardError;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Single-worker pool over a bounded FIFO queue
///
/// # Example
/// ```no_run
/// use holdfast_core_resilience::WorkerPool;
///
/// # async fn example() -> Result<(), holdfast_core_resilience::GuardError> {
/// let pool = WorkerPool::new(8);
/// pool.submit(async {
///     // Deferred background work
/// }).await?;
/// pool.stop().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct WorkerPool {
    queue: mpsc::Sender<Job>,
    stop: CancellationToken,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Create a pool with a queue of capacity `size` (clamped to at least 1)
    /// and spawn its worker task
    pub fn new(size: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<Job>(size.max(1));
        let stop = CancellationToken::new();

        let token = stop.clone();
        let worker = tokio::spawn(async move {
            loop {
                tokio::select! {
                    // Check the stop signal first so shutdown wins over
                    // queued work once the current item has finished.
                    biased;
                    _ = token.cancelled() => break,
                    job = rx.recv() => match job {
                        Some(job) => job.await,
                        None => break,
                    },
                }
            }
            let discarded = {
                rx.close();
                let mut n = 0usize;
                while rx.try_recv().is_ok() {
                    n += 1;
                }
                n
            };
            if discarded > 0 {
                debug!(discarded, "worker pool discarded queued items on stop");
            }
        });

        Self {
            queue: tx,
            stop,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Enqueue one unit of work
    ///
    /// Suspends while the queue is full. Returns [`GuardError::QueueClosed`]
    /// once the pool has stopped; synchronizing submission against shutdown
    /// is the caller's responsibility.
    pub async fn submit<F>(&self, work: F) -> Result<(), GuardError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.queue
            .send(Box::pin(work))
            .await
            .map_err(|_| GuardError::QueueClosed)
    }

    /// Stop the worker after its current item finishes
    ///
    /// Queued-but-unexecuted items are discarded, not drained. Safe to call
    /// more than once; later calls return immediately.
    pub async fn stop(&self) {
        self.stop.cancel();
        let handle = self.worker.lock().expect("pool lock poisoned").take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}
