//! Error types for task execution.

use std::time::Duration;

use thiserror::Error;

/// Boxed error produced by a broker client or other collaborator.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced while a task runs on a worker.
///
/// These never leave the worker pool: the worker logs them and moves on.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The audit event could not be encoded.
    #[error("failed to serialize audit event: {0}")]
    Serialize(#[from] serde_json::Error),
    /// No connection to the broker cluster could be established.
    #[error("failed to connect to brokers {brokers:?} for topic `{topic}`: {source}")]
    Connect {
        /// Bootstrap brokers that were tried.
        brokers: Vec<String>,
        /// Target topic.
        topic: String,
        /// Underlying client error.
        source: BoxError,
    },
    /// The broker rejected or failed the write.
    #[error("failed to write {payload_bytes} bytes to topic `{topic}`: {source}")]
    Write {
        /// Target topic.
        topic: String,
        /// Size of the serialized message value.
        payload_bytes: usize,
        /// Underlying client error.
        source: BoxError,
    },
    /// Connect + write did not finish before the deadline.
    #[error("publishing {payload_bytes} bytes to topic `{topic}` exceeded the {deadline:?} deadline")]
    Timeout {
        /// Target topic.
        topic: String,
        /// Size of the serialized message value.
        payload_bytes: usize,
        /// Deadline that elapsed.
        deadline: Duration,
    },
    /// Releasing the broker connection failed.
    #[error("failed to close connection for topic `{topic}`: {reason}")]
    Close {
        /// Target topic.
        topic: String,
        /// Description of the failure.
        reason: String,
    },
    /// The task panicked while running.
    #[error("task panicked: {0}")]
    Panicked(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
