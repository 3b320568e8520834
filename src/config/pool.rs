//! Worker pool configuration.

use serde::{Deserialize, Serialize};

/// Default number of persistent audit workers.
pub const DEFAULT_WORKER_COUNT: usize = 50;
/// Default number of pending tasks the queue holds before rejecting.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100_000;
/// Default worker thread stack size (2 MiB).
pub const DEFAULT_THREAD_STACK_SIZE: usize = 2 * 1024 * 1024;

/// Sizing for a [`WorkerPool`](crate::core::WorkerPool).
///
/// `queue_capacity` counts tasks that are waiting for a worker; tasks a worker
/// has already picked up do not occupy a queue slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerPoolConfig {
    /// Number of worker threads.
    pub worker_count: usize,
    /// Maximum queued (not yet running) tasks before rejection.
    pub queue_capacity: usize,
    /// Stack size for each worker thread in bytes.
    #[serde(default = "default_stack_size")]
    pub thread_stack_size: usize,
}

const fn default_stack_size() -> usize {
    DEFAULT_THREAD_STACK_SIZE
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            thread_stack_size: DEFAULT_THREAD_STACK_SIZE,
        }
    }
}

impl WorkerPoolConfig {
    /// Create a configuration with production defaults (50 workers, 100000 slots).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the worker count.
    #[must_use]
    pub const fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Set the queue capacity.
    #[must_use]
    pub const fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    /// Set the worker thread stack size.
    #[must_use]
    pub const fn with_thread_stack_size(mut self, thread_stack_size: usize) -> Self {
        self.thread_stack_size = thread_stack_size;
        self
    }

    /// Most tasks the pool holds at once: running plus waiting.
    #[must_use]
    pub const fn admission_limit(&self) -> usize {
        self.worker_count.saturating_add(self.queue_capacity)
    }

    /// Validate pool sizing.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first offending field.
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_count == 0 {
            return Err("worker_count must be greater than 0".into());
        }
        if self.queue_capacity == 0 {
            return Err("queue_capacity must be greater than 0".into());
        }
        if self.thread_stack_size < 64 * 1024 {
            return Err("thread_stack_size must be at least 64 KiB".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_production_sizing() {
        let cfg = WorkerPoolConfig::new();
        assert_eq!(cfg.worker_count, 50);
        assert_eq!(cfg.queue_capacity, 100_000);
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.admission_limit(), 100_050);
    }

    #[test]
    fn test_zero_sizes_rejected() {
        assert!(WorkerPoolConfig::new().with_worker_count(0).validate().is_err());
        assert!(WorkerPoolConfig::new().with_queue_capacity(0).validate().is_err());
        assert!(WorkerPoolConfig::new().with_thread_stack_size(1024).validate().is_err());
    }
}
