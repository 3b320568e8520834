//! Task abstraction executed by the worker pool.

use async_trait::async_trait;

use super::TaskError;

/// A unit of deferred, fire-and-forget work.
///
/// Once handed to [`WorkerPool::execute`](crate::core::WorkerPool::execute) a
/// task is owned by the pool and run exactly once by a single worker. The
/// `Result` of [`Task::run`] is only ever read by the worker's logging sink;
/// it never reaches whoever submitted the task.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use mine_search::core::{Task, TaskError};
///
/// struct Ping;
///
/// #[async_trait]
/// impl Task for Ping {
///     fn describe(&self) -> String {
///         "ping".into()
///     }
///
///     async fn run(&self) -> Result<(), TaskError> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Task: Send + Sync + 'static {
    /// Short human-readable description used in worker logs.
    fn describe(&self) -> String;

    /// Perform the work.
    ///
    /// # Threading
    ///
    /// Called from a dedicated worker thread on that worker's own
    /// single-threaded tokio runtime, so blocking here only ever stalls the
    /// one worker.
    async fn run(&self) -> Result<(), TaskError>;
}
