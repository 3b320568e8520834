//! `WorkerPool` implementation using OS threads.
//!
//! Each worker is a dedicated OS thread with its own single-threaded tokio
//! runtime, so a task's network write never runs on (or blocks) the runtime
//! that serves requests.
//!
//! # Design Principles
//!
//! - **No polling**: workers block on channel `recv`
//! - **Constant-time submit**: one admission check, one read lock and one `try_send`
//! - **Clean shutdown**: dropping the sender lets workers drain and exit

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use tokio::runtime::Runtime;
use tracing::{debug, error, info, warn};

use crate::config::WorkerPoolConfig;
use crate::core::{Task, TaskError};

use super::{PoolCounters, PoolError, PoolStats, WorkerTask};

/// How long `shutdown` waits for all workers before detaching the rest.
const SHUTDOWN_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Fixed-size pool of persistent workers draining one bounded FIFO queue.
///
/// The pool is an ordinary value: construct it once, wrap it in an `Arc` and
/// hand clones of that handle to every component that submits tasks.
///
/// # Lifecycle
///
/// `Running` until [`WorkerPool::shutdown`] is called or the pool is dropped.
/// After that, [`WorkerPool::execute`] fails fast with
/// [`PoolError::PoolShutdown`]. Tasks already queued at shutdown are still
/// drained by the workers.
pub struct WorkerPool {
    /// Pool configuration.
    config: WorkerPoolConfig,

    /// Task sender (to workers). `None` once shut down.
    task_tx: RwLock<Option<Sender<WorkerTask>>>,

    /// Pool statistics counters (lock-free atomics).
    counters: Arc<PoolCounters>,

    /// Shutdown flag.
    shutdown: AtomicBool,

    /// Worker thread handles.
    workers: Mutex<Vec<JoinHandle<()>>>,

    /// Task sequence counter.
    task_id_counter: AtomicU64,
}

impl WorkerPool {
    /// Create a new worker pool.
    ///
    /// Spawns `config.worker_count` OS threads immediately; each blocks until
    /// work arrives.
    ///
    /// # Errors
    ///
    /// - `PoolError::InvalidConfig` if the configuration is invalid
    /// - `PoolError::Internal` if a worker runtime or thread cannot be created
    pub fn new(config: WorkerPoolConfig) -> Result<Self, PoolError> {
        config.validate().map_err(PoolError::InvalidConfig)?;

        // Admission caps in-flight tasks at W + C, so the channel never fills first.
        let (task_tx, task_rx) = bounded::<WorkerTask>(config.admission_limit());
        let counters = Arc::new(PoolCounters::default());

        let mut workers = Vec::with_capacity(config.worker_count);
        for worker_id in 0..config.worker_count {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| {
                    PoolError::Internal(format!("failed to build runtime for worker {worker_id}: {e}"))
                })?;
            let worker = spawn_worker(
                worker_id,
                task_rx.clone(),
                Arc::clone(&counters),
                runtime,
                config.thread_stack_size,
            )
            .map_err(|e| PoolError::Internal(format!("failed to spawn worker {worker_id}: {e}")))?;
            workers.push(worker);
        }

        info!(
            worker_count = config.worker_count,
            queue_capacity = config.queue_capacity,
            "WorkerPool initialized"
        );

        Ok(Self {
            config,
            task_tx: RwLock::new(Some(task_tx)),
            counters,
            shutdown: AtomicBool::new(false),
            workers: Mutex::new(workers),
            task_id_counter: AtomicU64::new(0),
        })
    }

    /// Create a pool with `worker_count` workers and room for `queue_capacity`
    /// pending tasks.
    ///
    /// # Errors
    ///
    /// Same as [`WorkerPool::new`].
    pub fn with_capacity(worker_count: usize, queue_capacity: usize) -> Result<Self, PoolError> {
        Self::new(
            WorkerPoolConfig::new()
                .with_worker_count(worker_count)
                .with_queue_capacity(queue_capacity),
        )
    }

    /// Submit a task.
    ///
    /// Never blocks: the task is either enqueued or handed back as an error
    /// immediately, whatever the queue depth.
    ///
    /// # Errors
    ///
    /// - `PoolError::CapacityExceeded` if `worker_count + queue_capacity` tasks are in flight
    /// - `PoolError::PoolShutdown` if the pool has been shut down
    pub fn execute<T: Task>(&self, task: T) -> Result<(), PoolError> {
        self.execute_boxed(Box::new(task))
    }

    /// Submit an already boxed task. See [`WorkerPool::execute`].
    ///
    /// # Errors
    ///
    /// - `PoolError::CapacityExceeded` if `worker_count + queue_capacity` tasks are in flight
    /// - `PoolError::PoolShutdown` if the pool has been shut down
    pub fn execute_boxed(&self, task: Box<dyn Task>) -> Result<(), PoolError> {
        if self.shutdown.load(Ordering::Acquire) {
            return Err(PoolError::PoolShutdown);
        }

        let task_tx_guard = self.task_tx.read();
        let Some(task_tx) = task_tx_guard.as_ref() else {
            return Err(PoolError::PoolShutdown);
        };

        if !self.counters.try_admit(self.config.admission_limit()) {
            self.counters.rejected_tasks.fetch_add(1, Ordering::Relaxed);
            debug!("Worker pool is at capacity");
            return Err(PoolError::CapacityExceeded);
        }

        let task_id = self.task_id_counter.fetch_add(1, Ordering::Relaxed);

        // Counted before the send so a fast worker never sees the counter at zero.
        self.counters.queued_tasks.fetch_add(1, Ordering::Relaxed);

        match task_tx.try_send(WorkerTask { id: task_id, task }) {
            Ok(()) => {
                self.counters.submitted_tasks.fetch_add(1, Ordering::Relaxed);
                debug!(task_id = task_id, "Task submitted to worker pool");
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                self.counters.queued_tasks.fetch_sub(1, Ordering::Relaxed);
                self.counters.release();
                self.counters.rejected_tasks.fetch_add(1, Ordering::Relaxed);
                debug!(task_id = task_id, "Worker pool queue is full");
                Err(PoolError::CapacityExceeded)
            }
            Err(TrySendError::Disconnected(_)) => {
                self.counters.queued_tasks.fetch_sub(1, Ordering::Relaxed);
                self.counters.release();
                Err(PoolError::PoolShutdown)
            }
        }
    }

    /// Get current pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.counters
            .snapshot(self.config.worker_count, self.config.queue_capacity)
    }

    /// Pool configuration.
    #[must_use]
    pub const fn config(&self) -> &WorkerPoolConfig {
        &self.config
    }

    /// Whether the pool still accepts submissions.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Shut down the pool.
    ///
    /// Drops the task sender so workers finish whatever is queued and then
    /// exit. All workers share one 2 second join deadline; workers still busy
    /// when it passes are detached.
    pub fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }

        info!("Shutting down worker pool");

        *self.task_tx.write() = None;

        let workers: Vec<_> = self.workers.lock().drain(..).collect();
        let worker_count = workers.len();
        let deadline = Instant::now() + SHUTDOWN_JOIN_TIMEOUT;

        let (tx, rx) = std::sync::mpsc::channel();
        for (idx, worker) in workers.into_iter().enumerate() {
            let tx = tx.clone();
            thread::spawn(move || {
                let joined = worker.join().is_ok();
                let _ = tx.send((idx, joined));
            });
        }
        drop(tx);

        let mut exited = 0;
        while exited < worker_count {
            match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                Ok((idx, true)) => debug!(worker_id = idx, "Worker joined successfully"),
                Ok((idx, false)) => warn!(worker_id = idx, "Worker panicked"),
                Err(_) => break,
            }
            exited += 1;
        }

        if exited < worker_count {
            warn!(
                detached = worker_count - exited,
                "Workers did not exit within timeout - detaching"
            );
        }

        info!(worker_count = worker_count, "Worker pool shut down complete");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Signal only; joining here could hang on a worker stuck in a write.
        if !self.shutdown.swap(true, Ordering::AcqRel) {
            *self.task_tx.write() = None;
            debug!("WorkerPool dropped without explicit shutdown - workers will be detached");
        }
    }
}

/// Spawn a worker thread that owns `runtime` for its whole life.
fn spawn_worker(
    worker_id: usize,
    task_rx: Receiver<WorkerTask>,
    counters: Arc<PoolCounters>,
    runtime: Runtime,
    stack_size: usize,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("audit-worker-{worker_id}"))
        .stack_size(stack_size)
        .spawn(move || {
            debug!(worker_id = worker_id, "Worker thread started");

            // recv() returns Err only once the sender is gone and the queue is empty.
            while let Ok(WorkerTask { id, task }) = task_rx.recv() {
                counters.queued_tasks.fetch_sub(1, Ordering::Relaxed);
                counters.active_tasks.fetch_add(1, Ordering::Relaxed);

                debug!(worker_id = worker_id, task_id = id, "Worker executing task");

                let outcome = panic::catch_unwind(AssertUnwindSafe(|| runtime.block_on(task.run())))
                    .unwrap_or_else(|payload| Err(TaskError::Panicked(panic_message(payload.as_ref()))));

                // Slot is freed before the result is counted, so a caller that sees
                // the count can resubmit.
                counters.active_tasks.fetch_sub(1, Ordering::Relaxed);
                counters.release();

                match outcome {
                    Ok(()) => {
                        counters.completed_tasks.fetch_add(1, Ordering::Release);
                        debug!(worker_id = worker_id, task_id = id, "Worker completed task");
                    }
                    Err(err) => {
                        counters.failed_tasks.fetch_add(1, Ordering::Release);
                        error!(
                            worker_id = worker_id,
                            task_id = id,
                            task = %describe_guarded(&*task),
                            error = %err,
                            "Task failed"
                        );
                    }
                }
            }

            debug!(worker_id = worker_id, "Worker thread exiting");
        })
}

// `describe` runs outside the task guard, so it gets its own.
fn describe_guarded(task: &dyn Task) -> String {
    panic::catch_unwind(AssertUnwindSafe(|| task.describe()))
        .unwrap_or_else(|_| "<describe panicked>".to_string())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;

    #[derive(Clone)]
    struct CountingTask {
        runs: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl Task for CountingTask {
        fn describe(&self) -> String {
            "counting task".into()
        }

        async fn run(&self) -> Result<(), TaskError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            if self.fail {
                return Err(TaskError::Close {
                    topic: "test".into(),
                    reason: "simulated".into(),
                });
            }
            Ok(())
        }
    }

    fn wait_for(pool: &WorkerPool, pred: impl Fn(&PoolStats) -> bool) -> PoolStats {
        let start = Instant::now();
        loop {
            let stats = pool.stats();
            if pred(&stats) || start.elapsed() > Duration::from_secs(5) {
                return stats;
            }
            thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn test_worker_pool_runs_tasks() {
        let runs = Arc::new(AtomicUsize::new(0));
        let pool = WorkerPool::with_capacity(2, 10).unwrap();

        for _ in 0..5 {
            pool.execute(CountingTask { runs: Arc::clone(&runs), fail: false })
                .unwrap();
        }

        let stats = wait_for(&pool, |s| s.completed_tasks == 5);
        assert_eq!(stats.completed_tasks, 5);
        assert_eq!(stats.submitted_tasks, 5);
        assert_eq!(runs.load(Ordering::SeqCst), 5);
        pool.shutdown();
    }

    #[test]
    fn test_failed_tasks_are_counted_not_fatal() {
        let runs = Arc::new(AtomicUsize::new(0));
        let pool = WorkerPool::with_capacity(1, 10).unwrap();

        pool.execute(CountingTask { runs: Arc::clone(&runs), fail: true }).unwrap();
        pool.execute(CountingTask { runs: Arc::clone(&runs), fail: false }).unwrap();

        let stats = wait_for(&pool, |s| s.completed_tasks + s.failed_tasks == 2);
        assert_eq!(stats.failed_tasks, 1);
        assert_eq!(stats.completed_tasks, 1);
        pool.shutdown();
    }

    #[test]
    fn test_execute_after_shutdown_fails_fast() {
        let pool = WorkerPool::with_capacity(1, 1).unwrap();
        pool.shutdown();
        assert!(pool.is_shutdown());

        let err = pool
            .execute(CountingTask { runs: Arc::new(AtomicUsize::new(0)), fail: false })
            .unwrap_err();
        assert_eq!(err, PoolError::PoolShutdown);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = WorkerPool::with_capacity(0, 10).err().unwrap();
        assert!(matches!(err, PoolError::InvalidConfig(_)));
    }

    #[test]
    fn test_panic_message_extraction() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");
        let boxed: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(boxed.as_ref()), "non-string panic payload");
    }
}
