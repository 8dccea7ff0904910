//! librdkafka-backed log adapters.
//!
//! - `KafkaLogConsumerFactory` / `KafkaLogConsumer` - `StreamConsumer` per session
//! - `KafkaLogProducer` - `FutureProducer` with `acks=all`
//! - `KafkaClusterAdmin` - Metadata queries and topic creation
//!
//! All clients share one `KafkaClientSettings`, built from `KafkaConfig`.

mod admin;
mod client_config;
mod consumer;
mod producer;

pub use admin::KafkaClusterAdmin;
pub use client_config::KafkaClientSettings;
pub use consumer::{KafkaLogConsumer, KafkaLogConsumerFactory};
pub use producer::KafkaLogProducer;
