//! In-memory broker for tests and local development.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::{BrokerConnector, BrokerMessage, PublishTarget, TaskError, TopicWriter};

/// A message accepted by the in-memory broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredMessage {
    /// Topic written to.
    pub topic: String,
    /// Message key.
    pub key: Vec<u8>,
    /// Message value.
    pub value: Vec<u8>,
}

#[derive(Default)]
struct BrokerState {
    delivered: Mutex<Vec<DeliveredMessage>>,
    write_attempts: Mutex<Vec<String>>,
    failing_writes: Mutex<HashSet<String>>,
    failing_connects: Mutex<HashSet<String>>,
    write_delay: Mutex<Option<Duration>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
}

/// Broker that keeps every message in memory.
///
/// Cloning yields another handle onto the same state, so a test can keep one
/// handle for assertions while the pipeline owns the other.
#[derive(Clone, Default)]
pub struct InMemoryBroker {
    state: Arc<BrokerState>,
}

impl InMemoryBroker {
    /// Create an empty broker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write to `topic` fail.
    pub fn fail_writes_to(&self, topic: impl Into<String>) {
        self.state.failing_writes.lock().insert(topic.into());
    }

    /// Make every connection attempt for `topic` fail.
    pub fn fail_connections_to(&self, topic: impl Into<String>) {
        self.state.failing_connects.lock().insert(topic.into());
    }

    /// Delay each write by `delay`.
    pub fn set_write_delay(&self, delay: Duration) {
        *self.state.write_delay.lock() = Some(delay);
    }

    /// Snapshot of all delivered messages in arrival order.
    #[must_use]
    pub fn messages(&self) -> Vec<DeliveredMessage> {
        self.state.delivered.lock().clone()
    }

    /// Delivered messages for one topic.
    #[must_use]
    pub fn messages_for(&self, topic: &str) -> Vec<DeliveredMessage> {
        self.state
            .delivered
            .lock()
            .iter()
            .filter(|m| m.topic == topic)
            .cloned()
            .collect()
    }

    /// Topics of every write attempted, successful or not.
    #[must_use]
    pub fn write_attempts(&self) -> Vec<String> {
        self.state.write_attempts.lock().clone()
    }

    /// Number of connections opened.
    #[must_use]
    pub fn connections_opened(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    /// Number of connections closed.
    #[must_use]
    pub fn connections_closed(&self) -> usize {
        self.state.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrokerConnector for InMemoryBroker {
    async fn connect(&self, target: &PublishTarget) -> Result<Box<dyn TopicWriter>, TaskError> {
        if self.state.failing_connects.lock().contains(&target.topic) {
            return Err(TaskError::Connect {
                brokers: target.brokers.clone(),
                topic: target.topic.clone(),
                source: "connection refused".into(),
            });
        }
        self.state.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(InMemoryWriter {
            state: Arc::clone(&self.state),
            topic: target.topic.clone(),
            open: true,
        }))
    }
}

struct InMemoryWriter {
    state: Arc<BrokerState>,
    topic: String,
    open: bool,
}

#[async_trait]
impl TopicWriter for InMemoryWriter {
    async fn write(&mut self, message: BrokerMessage) -> Result<(), TaskError> {
        self.state.write_attempts.lock().push(self.topic.clone());

        let delay = *self.state.write_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.state.failing_writes.lock().contains(&self.topic) {
            return Err(TaskError::Write {
                topic: self.topic.clone(),
                payload_bytes: message.value.len(),
                source: "broker unavailable".into(),
            });
        }

        self.state.delivered.lock().push(DeliveredMessage {
            topic: self.topic.clone(),
            key: message.key,
            value: message.value,
        });
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TaskError> {
        if self.open {
            self.open = false;
            self.state.closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}
