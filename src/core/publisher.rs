//! Broker publishing: open a connection, write one message, close.
//!
//! Every audit task opens its own connection and releases it afterwards,
//! whatever the write outcome. Nothing is pooled across tasks.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, warn};

use super::TaskError;

/// Default deadline for connect + write.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(3);

/// Where a message goes: bootstrap brokers plus topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishTarget {
    /// Ordered `host:port` bootstrap addresses.
    pub brokers: Vec<String>,
    /// Topic name.
    pub topic: String,
}

impl PublishTarget {
    /// Build a target.
    pub fn new(brokers: Vec<String>, topic: impl Into<String>) -> Self {
        Self {
            brokers,
            topic: topic.into(),
        }
    }
}

impl fmt::Display for PublishTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "topic `{}` via [{}]", self.topic, self.brokers.join(","))
    }
}

/// A single keyed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerMessage {
    /// Message key.
    pub key: Vec<u8>,
    /// Message value.
    pub value: Vec<u8>,
}

/// Opens broker connections bound to one topic.
#[async_trait]
pub trait BrokerConnector: Send + Sync + 'static {
    /// Open a fresh connection for `target`.
    async fn connect(&self, target: &PublishTarget) -> Result<Box<dyn TopicWriter>, TaskError>;
}

/// An open connection able to write to one topic.
#[async_trait]
pub trait TopicWriter: Send {
    /// Write one message.
    async fn write(&mut self, message: BrokerMessage) -> Result<(), TaskError>;

    /// Release the connection.
    async fn close(&mut self) -> Result<(), TaskError>;
}

/// Publish one message with at-most-once semantics.
///
/// Connect and write share `deadline`; close always runs afterwards with its
/// own `deadline`. When both the write and the close fail, the close failure
/// is logged here and the write error is returned.
///
/// # Errors
///
/// The first failure among connect, write and close.
pub async fn publish(
    connector: &dyn BrokerConnector,
    target: &PublishTarget,
    message: BrokerMessage,
    deadline: Duration,
) -> Result<(), TaskError> {
    let payload_bytes = message.value.len();
    let expires_at = Instant::now() + deadline;
    let timed_out = || TaskError::Timeout {
        topic: target.topic.clone(),
        payload_bytes,
        deadline,
    };

    let mut writer = timeout_at(expires_at, connector.connect(target))
        .await
        .map_err(|_| timed_out())??;

    let write_result = timeout_at(expires_at, writer.write(message))
        .await
        .unwrap_or_else(|_| Err(timed_out()));

    let close_result = timeout(deadline, writer.close())
        .await
        .unwrap_or_else(|_| {
            Err(TaskError::Close {
                topic: target.topic.clone(),
                reason: format!("close did not finish within {deadline:?}"),
            })
        });

    match (write_result, close_result) {
        (Ok(()), Ok(())) => {
            debug!(topic = %target.topic, payload_bytes = payload_bytes, "Published audit message");
            Ok(())
        }
        (Ok(()), Err(close_err)) => Err(close_err),
        (Err(write_err), Ok(())) => Err(write_err),
        (Err(write_err), Err(close_err)) => {
            warn!(
                brokers = ?target.brokers,
                topic = %target.topic,
                payload_bytes = payload_bytes,
                error = %close_err,
                "Failed to close broker connection after failed write"
            );
            Err(write_err)
        }
    }
}
