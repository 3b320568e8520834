//! Bounded worker pool with dedicated worker threads.
//!
//! The pool owns every concurrency and capacity decision of the audit
//! pipeline: a fixed set of long-lived workers drain one shared bounded queue
//! of [`Task`](crate::core::Task)s.
//!
//! # Key Properties
//!
//! - **Non-blocking submit**: `execute` reserves an admission slot and does a
//!   single `try_send`; a full pool is reported as
//!   [`PoolError::CapacityExceeded`] instead of blocking the caller
//! - **Bounded concurrency**: at most `worker_count` tasks run at once
//! - **Failure isolation**: a task that errors or panics is logged and the
//!   worker moves on to the next one
//!
//! # Capacity accounting
//!
//! `queue_capacity` counts only tasks waiting for a worker. With 2 workers and
//! capacity 3, two tasks can be running while three more wait; the sixth
//! submission is rejected.
//!
//! Admission is decided by one counter of queued plus running tasks, capped at
//! `worker_count + queue_capacity`. A burst of that many submissions is
//! accepted even before any worker has picked up its first task.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use mine_search::core::WorkerPool;
//!
//! let pool = Arc::new(WorkerPool::with_capacity(50, 100_000)?);
//! if let Err(err) = pool.execute(task) {
//!     tracing::warn!(error = %err, "audit task rejected");
//! }
//! ```

mod native;

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use serde::Serialize;
use thiserror::Error;

use crate::core::Task;

/// Errors returned synchronously to code that submits work to a `WorkerPool`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PoolError {
    /// The task queue is full; the task was not accepted.
    #[error("capacity exceeded: task queue is full")]
    CapacityExceeded,

    /// The pool has been shut down and accepts no new work.
    #[error("pool has been shut down")]
    PoolShutdown,

    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Worker thread or runtime could not be created.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Statistics about pool utilization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Number of worker threads.
    pub worker_count: usize,

    /// Maximum number of queued tasks.
    pub queue_capacity: usize,

    /// Currently executing tasks.
    pub active_tasks: u64,

    /// Tasks waiting in the queue.
    pub queued_tasks: u64,

    /// Total tasks accepted by `execute`.
    pub submitted_tasks: u64,

    /// Tasks whose `run` returned `Ok`.
    pub completed_tasks: u64,

    /// Tasks whose `run` returned `Err` or panicked.
    pub failed_tasks: u64,

    /// Submissions turned away because the queue was full.
    pub rejected_tasks: u64,
}

/// Internal counters for pool statistics (thread-safe).
#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    pub active_tasks: AtomicU64,
    pub queued_tasks: AtomicU64,
    pub submitted_tasks: AtomicU64,
    pub completed_tasks: AtomicU64,
    pub failed_tasks: AtomicU64,
    pub rejected_tasks: AtomicU64,
    /// Admitted tasks not yet finished (queued + running).
    pub in_flight: AtomicUsize,
}

impl PoolCounters {
    /// Reserve one admission slot unless `limit` tasks are already in flight.
    pub fn try_admit(&self, limit: usize) -> bool {
        let mut current = self.in_flight.load(Ordering::Acquire);
        loop {
            if current >= limit {
                return false;
            }
            match self.in_flight.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// Give back a slot taken by [`PoolCounters::try_admit`].
    pub fn release(&self) {
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
    }

    /// Get a snapshot of current statistics.
    pub fn snapshot(&self, worker_count: usize, queue_capacity: usize) -> PoolStats {
        PoolStats {
            worker_count,
            queue_capacity,
            active_tasks: self.active_tasks.load(Ordering::Relaxed),
            queued_tasks: self.queued_tasks.load(Ordering::Relaxed),
            submitted_tasks: self.submitted_tasks.load(Ordering::Relaxed),
            completed_tasks: self.completed_tasks.load(Ordering::Acquire),
            failed_tasks: self.failed_tasks.load(Ordering::Acquire),
            rejected_tasks: self.rejected_tasks.load(Ordering::Relaxed),
        }
    }
}

/// A task in flight through the queue, tagged with its sequence number.
pub(crate) struct WorkerTask {
    /// Sequence number assigned at submission.
    pub id: u64,
    /// The task itself.
    pub task: Box<dyn Task>,
}

pub use native::WorkerPool;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_error_display() {
        assert_eq!(
            PoolError::CapacityExceeded.to_string(),
            "capacity exceeded: task queue is full"
        );
        assert_eq!(PoolError::PoolShutdown.to_string(), "pool has been shut down");
        assert_eq!(
            PoolError::InvalidConfig("worker_count must be greater than 0".into()).to_string(),
            "invalid configuration: worker_count must be greater than 0"
        );
    }

    #[test]
    fn test_pool_stats_default() {
        let stats = PoolStats::default();
        assert_eq!(stats.worker_count, 0);
        assert_eq!(stats.active_tasks, 0);
        assert_eq!(stats.rejected_tasks, 0);
    }

    #[test]
    fn test_pool_counters_snapshot() {
        let counters = PoolCounters::default();
        counters.submitted_tasks.fetch_add(10, Ordering::Relaxed);
        counters.completed_tasks.fetch_add(5, Ordering::Relaxed);
        counters.failed_tasks.fetch_add(2, Ordering::Relaxed);
        counters.rejected_tasks.fetch_add(1, Ordering::Relaxed);

        let stats = counters.snapshot(4, 1000);
        assert_eq!(stats.worker_count, 4);
        assert_eq!(stats.queue_capacity, 1000);
        assert_eq!(stats.submitted_tasks, 10);
        assert_eq!(stats.completed_tasks, 5);
        assert_eq!(stats.failed_tasks, 2);
        assert_eq!(stats.rejected_tasks, 1);
    }

    #[test]
    fn test_admission_capped_and_released() {
        let counters = PoolCounters::default();
        assert!(counters.try_admit(2));
        assert!(counters.try_admit(2));
        assert!(!counters.try_admit(2));

        counters.release();
        assert!(counters.try_admit(2));
        assert_eq!(counters.in_flight.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_pool_error_is_cloneable() {
        let err = PoolError::InvalidConfig("bad".into());
        assert_eq!(err.clone(), err);
    }
}
