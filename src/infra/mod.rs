//! Infrastructure adapters for message brokers.

pub mod broker;

pub use broker::{InMemoryBroker, KafkaConnector};
