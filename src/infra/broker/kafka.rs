//! Kafka backend built on `rskafka`.
//!
//! A connection here is a bootstrap client plus a partition client for the
//! target topic. It lives for exactly one message and is dropped on close.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use rskafka::client::partition::{Compression, PartitionClient, UnknownTopicHandling};
use rskafka::client::ClientBuilder;
use rskafka::record::Record;
use tracing::debug;

use crate::core::{BrokerConnector, BrokerMessage, PublishTarget, TaskError, TopicWriter};

/// Opens a new Kafka connection per message.
///
/// Partitions of the target topic are chosen round-robin across connections.
#[derive(Debug, Default)]
pub struct KafkaConnector {
    next_partition: AtomicUsize,
}

impl KafkaConnector {
    /// Create a connector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn pick_partition(&self, partitions: &[i32]) -> Option<i32> {
        if partitions.is_empty() {
            return None;
        }
        let idx = self.next_partition.fetch_add(1, Ordering::Relaxed) % partitions.len();
        partitions.get(idx).copied()
    }
}

#[async_trait]
impl BrokerConnector for KafkaConnector {
    async fn connect(&self, target: &PublishTarget) -> Result<Box<dyn TopicWriter>, TaskError> {
        let connect_err = |source: Box<dyn std::error::Error + Send + Sync>| TaskError::Connect {
            brokers: target.brokers.clone(),
            topic: target.topic.clone(),
            source,
        };

        let client = ClientBuilder::new(target.brokers.clone())
            .build()
            .await
            .map_err(|e| connect_err(Box::new(e)))?;

        let partitions: Vec<i32> = client
            .list_topics()
            .await
            .map_err(|e| connect_err(Box::new(e)))?
            .into_iter()
            .find(|topic| topic.name == target.topic)
            .map(|topic| topic.partitions.into_iter().collect())
            .unwrap_or_default();

        let partition = self
            .pick_partition(&partitions)
            .ok_or_else(|| connect_err(format!("topic `{}` not found", target.topic).into()))?;

        let partition_client = client
            .partition_client(target.topic.clone(), partition, UnknownTopicHandling::Error)
            .await
            .map_err(|e| connect_err(Box::new(e)))?;

        debug!(topic = %target.topic, partition = partition, "Opened Kafka partition client");

        Ok(Box::new(KafkaWriter {
            topic: target.topic.clone(),
            client: Some(partition_client),
        }))
    }
}

struct KafkaWriter {
    topic: String,
    client: Option<PartitionClient>,
}

#[async_trait]
impl TopicWriter for KafkaWriter {
    async fn write(&mut self, message: BrokerMessage) -> Result<(), TaskError> {
        let payload_bytes = message.value.len();
        let Some(client) = self.client.as_ref() else {
            return Err(TaskError::Write {
                topic: self.topic.clone(),
                payload_bytes,
                source: "connection already closed".into(),
            });
        };

        let record = Record {
            key: Some(message.key),
            value: Some(message.value),
            headers: BTreeMap::new(),
            timestamp: Utc::now(),
        };

        client
            .produce(vec![record], Compression::NoCompression)
            .await
            .map(|_offsets| ())
            .map_err(|e| TaskError::Write {
                topic: self.topic.clone(),
                payload_bytes,
                source: Box::new(e),
            })
    }

    async fn close(&mut self) -> Result<(), TaskError> {
        match self.client.take() {
            Some(client) => {
                drop(client);
                Ok(())
            }
            None => Err(TaskError::Close {
                topic: self.topic.clone(),
                reason: "connection already closed".into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partitions_round_robin() {
        let connector = KafkaConnector::new();
        let partitions = [0, 1, 2];
        let picked: Vec<i32> = (0..4)
            .filter_map(|_| connector.pick_partition(&partitions))
            .collect();
        assert_eq!(picked, vec![0, 1, 2, 0]);
    }

    #[test]
    fn test_no_partitions_means_no_pick() {
        let connector = KafkaConnector::new();
        assert_eq!(connector.pick_partition(&[]), None);
    }
}
