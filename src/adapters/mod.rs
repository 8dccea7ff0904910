//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `kafka` - librdkafka consumers, producer and admin client
//! - `memory` - In-process log implementing the same ports
//! - `broadcast` - Fan-out of consumed records to live viewers
//! - `http` - REST endpoints
//! - `websocket` - Live record streaming to browsers

pub mod broadcast;
pub mod http;
pub mod kafka;
pub mod memory;
pub mod websocket;

pub use broadcast::InMemorySessionMessageBroadcaster;
pub use kafka::{KafkaClientSettings, KafkaClusterAdmin, KafkaLogConsumerFactory, KafkaLogProducer};
pub use memory::InMemoryLog;
