//! Broker backends.

pub mod kafka;
pub mod memory;

pub use kafka::KafkaConnector;
pub use memory::{DeliveredMessage, InMemoryBroker};
