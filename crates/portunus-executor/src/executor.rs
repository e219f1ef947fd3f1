//! Bounded worker pool with explicit admission control.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures_util::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use portunus_core::{PortunusError, PortunusResult};

/// Admission policy for work submitted beyond the free worker slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueuePolicy {
    /// Zero-capacity hand-off: the submitter awaits until a worker slot is
    /// free. This is the back-pressure policy.
    Handoff,
    /// Up to this many submissions may wait beyond the running set; anything
    /// past that is rejected immediately.
    Bounded(usize),
}

/// Configuration for the executor.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Number of worker slots. Defaults to available parallelism.
    pub workers: usize,
    /// Admission policy for submissions beyond the free slots.
    pub queue: QueuePolicy,
    /// How long shutdown waits for in-flight work before cancelling it.
    pub keep_alive: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism().map_or(4, usize::from),
            queue: QueuePolicy::Handoff,
            keep_alive: Duration::from_secs(30),
        }
    }
}

impl ExecutorConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of worker slots.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Sets the admission policy.
    #[must_use]
    pub fn with_queue(mut self, queue: QueuePolicy) -> Self {
        self.queue = queue;
        self
    }

    /// Sets the shutdown keep-alive timeout.
    #[must_use]
    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }
}

/// Unique identifier for a submitted task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(uuid::Uuid);

impl TaskId {
    fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of a graceful shutdown.
#[derive(Debug, Clone)]
pub struct ShutdownReport {
    /// Tasks that ran to completion over the executor's lifetime.
    pub completed: u64,
    /// Tasks whose panic was caught and logged.
    pub panicked: u64,
    /// Tasks still in flight when the keep-alive expired; these were
    /// cancelled.
    pub abandoned: Vec<TaskId>,
}

struct Inner {
    config: ExecutorConfig,
    /// Gates admission: `workers` permits for hand-off, `workers + n` for a
    /// bounded queue of capacity `n`.
    admission: Arc<Semaphore>,
    /// Bounds true concurrency at `workers` regardless of queue capacity.
    slots: Arc<Semaphore>,
    running: DashMap<TaskId, JoinHandle<()>>,
    accepting: AtomicBool,
    completed: AtomicU64,
    panicked: AtomicU64,
}

/// A bounded worker pool executing dispatch-unit tasks.
///
/// Submissions beyond capacity are either awaited (hand-off) or rejected
/// (bounded queue) — never queued unboundedly and never silently dropped.
/// Task panics are caught and logged; they do not poison the pool.
///
/// # Example
///
/// ```
/// use portunus_executor::{Executor, ExecutorConfig, QueuePolicy};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let executor = Executor::new(
///     ExecutorConfig::new()
///         .with_workers(2)
///         .with_queue(QueuePolicy::Bounded(8)),
/// );
///
/// executor.execute(async { /* unit of work */ }).await.unwrap();
/// let report = executor.shutdown().await;
/// assert!(report.abandoned.is_empty());
/// # }
/// ```
#[derive(Clone)]
pub struct Executor {
    inner: Arc<Inner>,
}

impl Executor {
    /// Creates an executor with the given configuration.
    #[must_use]
    pub fn new(config: ExecutorConfig) -> Self {
        let admitted = match config.queue {
            QueuePolicy::Handoff => config.workers,
            QueuePolicy::Bounded(capacity) => config.workers + capacity,
        };
        info!(
            workers = config.workers,
            queue = ?config.queue,
            "starting executor"
        );
        Self {
            inner: Arc::new(Inner {
                admission: Arc::new(Semaphore::new(admitted)),
                slots: Arc::new(Semaphore::new(config.workers)),
                running: DashMap::new(),
                accepting: AtomicBool::new(true),
                completed: AtomicU64::new(0),
                panicked: AtomicU64::new(0),
                config,
            }),
        }
    }

    /// Submits a unit of work.
    ///
    /// Under [`QueuePolicy::Handoff`] this call awaits until a worker slot
    /// frees up; under [`QueuePolicy::Bounded`] it returns
    /// [`PortunusError::Rejected`] once the queue is full. Either way a
    /// submission is never dropped without the caller learning about it.
    ///
    /// # Errors
    ///
    /// Returns [`PortunusError::Rejected`] if the executor is shutting down
    /// or the bounded queue is at capacity.
    pub async fn execute<F>(&self, task: F) -> PortunusResult<TaskId>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if !self.inner.accepting.load(Ordering::SeqCst) {
            return Err(PortunusError::rejected("executor is shutting down"));
        }
        self.reap_finished();

        let permit = match self.inner.config.queue {
            QueuePolicy::Handoff => Arc::clone(&self.inner.admission)
                .acquire_owned()
                .await
                .map_err(|_| PortunusError::rejected("executor is shutting down"))?,
            QueuePolicy::Bounded(capacity) => Arc::clone(&self.inner.admission)
                .try_acquire_owned()
                .map_err(|_| {
                    warn!(capacity, "executor queue full, rejecting submission");
                    PortunusError::rejected("executor queue is full")
                })?,
        };

        // Re-check after a potentially long hand-off wait.
        if !self.inner.accepting.load(Ordering::SeqCst) {
            return Err(PortunusError::rejected("executor is shutting down"));
        }

        let id = TaskId::new();
        let inner = Arc::clone(&self.inner);
        let slots = Arc::clone(&self.inner.slots);
        let handle = tokio::spawn(async move {
            let _admission = permit;
            let Ok(_slot) = slots.acquire_owned().await else {
                return;
            };
            match AssertUnwindSafe(task).catch_unwind().await {
                Ok(()) => {
                    inner.completed.fetch_add(1, Ordering::Relaxed);
                }
                Err(panic) => {
                    inner.panicked.fetch_add(1, Ordering::Relaxed);
                    error!(task_id = %id, cause = %panic_message(&panic), "task panicked");
                }
            }
            inner.running.remove(&id);
        });
        self.inner.running.insert(id, handle);
        debug!(task_id = %id, "task admitted");
        Ok(id)
    }

    /// Returns the number of tasks currently admitted and not yet finished.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.reap_finished();
        self.inner.running.len()
    }

    /// Returns the number of tasks that ran to completion.
    #[must_use]
    pub fn completed(&self) -> u64 {
        self.inner.completed.load(Ordering::Relaxed)
    }

    /// Stops accepting work, waits up to the configured keep-alive for
    /// in-flight tasks, then cancels and reports the remainder.
    pub async fn shutdown(&self) -> ShutdownReport {
        self.inner.accepting.store(false, Ordering::SeqCst);
        info!("executor shutting down");

        let deadline = tokio::time::Instant::now() + self.inner.config.keep_alive;
        loop {
            self.reap_finished();
            if self.inner.running.is_empty() || tokio::time::Instant::now() >= deadline {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let mut abandoned = Vec::new();
        for entry in self.inner.running.iter() {
            entry.value().abort();
            abandoned.push(*entry.key());
        }
        self.inner.running.clear();

        if abandoned.is_empty() {
            info!("executor drained cleanly");
        } else {
            warn!(
                count = abandoned.len(),
                "keep-alive expired, cancelling in-flight tasks"
            );
        }

        ShutdownReport {
            completed: self.inner.completed.load(Ordering::Relaxed),
            panicked: self.inner.panicked.load(Ordering::Relaxed),
            abandoned,
        }
    }

    /// Drops registry entries whose task already finished. A task normally
    /// removes itself, but may lose the race with its own insertion.
    fn reap_finished(&self) {
        self.inner.running.retain(|_, handle| !handle.is_finished());
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    fn config(workers: usize, queue: QueuePolicy) -> ExecutorConfig {
        ExecutorConfig::new()
            .with_workers(workers)
            .with_queue(queue)
            .with_keep_alive(Duration::from_millis(200))
    }

    #[tokio::test]
    async fn test_executes_submitted_work() {
        let executor = Executor::new(config(2, QueuePolicy::Bounded(4)));
        let (tx, rx) = oneshot::channel();
        executor
            .execute(async move {
                let _ = tx.send(42);
            })
            .await
            .unwrap();
        assert_eq!(rx.await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_handoff_blocks_submitter_until_slot_frees() {
        let executor = Executor::new(config(1, QueuePolicy::Handoff));
        let (gate_tx, gate_rx) = oneshot::channel::<()>();
        executor
            .execute(async move {
                let _ = gate_rx.await;
            })
            .await
            .unwrap();

        // All workers busy: a further submission must block, not drop.
        let blocked = tokio::time::timeout(
            Duration::from_millis(50),
            executor.execute(async {}),
        )
        .await;
        assert!(blocked.is_err(), "hand-off submission should have blocked");

        // Release the worker; the same submission now goes through.
        gate_tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), executor.execute(async {}))
            .await
            .expect("submission should proceed once a slot freed")
            .unwrap();
    }

    #[tokio::test]
    async fn test_bounded_queue_rejects_beyond_capacity() {
        let executor = Executor::new(config(1, QueuePolicy::Bounded(0)));
        let (gate_tx, gate_rx) = oneshot::channel::<()>();
        executor
            .execute(async move {
                let _ = gate_rx.await;
            })
            .await
            .unwrap();

        let err = executor.execute(async {}).await.unwrap_err();
        assert!(matches!(err, PortunusError::Rejected { .. }));

        gate_tx.send(()).unwrap();
    }

    #[tokio::test]
    async fn test_panic_is_caught_and_pool_survives() {
        let executor = Executor::new(config(1, QueuePolicy::Bounded(4)));
        executor
            .execute(async {
                panic!("handler exploded");
            })
            .await
            .unwrap();

        // The pool keeps executing after a panic.
        let (tx, rx) = oneshot::channel();
        executor
            .execute(async move {
                let _ = tx.send(());
            })
            .await
            .unwrap();
        rx.await.unwrap();

        let report = executor.shutdown().await;
        assert_eq!(report.panicked, 1);
        assert_eq!(report.completed, 1);
    }

    #[tokio::test]
    async fn test_shutdown_rejects_new_work() {
        let executor = Executor::new(config(1, QueuePolicy::Handoff));
        executor.shutdown().await;
        let err = executor.execute(async {}).await.unwrap_err();
        assert!(matches!(err, PortunusError::Rejected { .. }));
    }

    #[tokio::test]
    async fn test_shutdown_reports_abandoned_tasks() {
        let executor = Executor::new(config(1, QueuePolicy::Bounded(0)));
        let (_gate_tx, gate_rx) = oneshot::channel::<()>();
        let id = executor
            .execute(async move {
                // Never completes: the gate sender is held open.
                let _ = gate_rx.await;
            })
            .await
            .unwrap();

        let report = executor.shutdown().await;
        assert_eq!(report.abandoned, vec![id]);
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_in_flight_work() {
        let executor = Executor::new(config(1, QueuePolicy::Bounded(0)));
        executor
            .execute(async {
                tokio::time::sleep(Duration::from_millis(20)).await;
            })
            .await
            .unwrap();

        let report = executor.shutdown().await;
        assert!(report.abandoned.is_empty());
        assert_eq!(report.completed, 1);
        assert_eq!(executor.completed(), 1);
        assert_eq!(executor.in_flight(), 0);
    }
}
