//! Log backend ports - Capability interfaces over a partitioned log.
//!
//! The consume-session core only sees these traits. Production wiring plugs
//! in the librdkafka adapters; tests and local runs use the in-memory log.
//!
//! ## Consumer contract
//!
//! 1. `subscribe(topic)` once, before the first poll
//! 2. `poll(timeout)` repeatedly; returns whatever arrived within `timeout`
//! 3. `pause()` / `resume()` stop and restart fetching for the current assignment
//! 4. `close()` releases the client; the consumer is dropped afterwards
//!
//! `poll` must be cancel-safe: dropping the returned future before it
//! completes must not lose records. The consumption engine relies on this to
//! interrupt a fetch when a session is paused, resumed or stopped.

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::cluster::{ClusterInfo, ProduceRequest, ProduceResponse, TopicInfo, TopicSpec};
use crate::domain::consume::{ConsumedMessage, OffsetPolicy};

/// Errors raised by log backend adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The cluster could not be reached.
    #[error("Cluster unreachable: {0}")]
    Connectivity(String),

    /// The client could not be configured.
    #[error("Invalid client configuration: {0}")]
    Configuration(String),

    /// A request against the cluster failed.
    #[error("Backend operation failed: {0}")]
    Operation(String),
}

impl BackendError {
    pub fn connectivity(message: impl Into<String>) -> Self {
        BackendError::Connectivity(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        BackendError::Configuration(message.into())
    }

    pub fn operation(message: impl Into<String>) -> Self {
        BackendError::Operation(message.into())
    }
}

/// A single consumer-group member reading one topic.
#[async_trait]
pub trait LogConsumer: Send {
    /// Subscribes to `topic`.
    fn subscribe(&mut self, topic: &str) -> Result<(), BackendError>;

    /// Waits up to `timeout` for records. An empty batch is not an error.
    async fn poll(&mut self, timeout: Duration) -> Result<Vec<ConsumedMessage>, BackendError>;

    /// Stops fetching for the current assignment.
    fn pause(&mut self) -> Result<(), BackendError>;

    /// Restarts fetching for the current assignment.
    fn resume(&mut self) -> Result<(), BackendError>;

    /// Leaves the group and releases client resources.
    fn close(&mut self);
}

/// Creates consumers bound to a consumer group.
pub trait LogConsumerFactory: Send + Sync {
    fn create_consumer(
        &self,
        group_id: &str,
        from: OffsetPolicy,
    ) -> Result<Box<dyn LogConsumer>, BackendError>;
}

/// Writes single records.
#[async_trait]
pub trait LogProducer: Send + Sync {
    async fn send(&self, request: &ProduceRequest) -> Result<ProduceResponse, BackendError>;
}

/// Cluster metadata and topic administration.
#[async_trait]
pub trait ClusterAdmin: Send + Sync {
    async fn describe_cluster(&self) -> Result<ClusterInfo, BackendError>;

    async fn list_topics(&self) -> Result<Vec<TopicInfo>, BackendError>;

    /// Creates each topic that does not already exist. Returns the names created.
    async fn create_topics(&self, topics: &[TopicSpec]) -> Result<Vec<String>, BackendError>;
}
