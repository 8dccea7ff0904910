//! Cluster metadata and topic creation.
//!
//! Metadata calls block inside librdkafka, so they run on the blocking pool.

use async_trait::async_trait;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::consumer::{BaseConsumer, Consumer};
use rdkafka::metadata::Metadata;
use rdkafka::types::RDKafkaErrorCode;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::cluster::{BrokerInfo, ClusterInfo, TopicInfo, TopicSpec};
use crate::ports::{BackendError, ClusterAdmin};

use super::client_config::{map_kafka_error, KafkaClientSettings};

pub struct KafkaClusterAdmin {
    metadata_client: Arc<BaseConsumer>,
    admin: AdminClient<DefaultClientContext>,
    timeout: Duration,
}

impl KafkaClusterAdmin {
    pub fn new(settings: &KafkaClientSettings) -> Result<Self, BackendError> {
        let metadata_client: BaseConsumer =
            settings.client_config().create().map_err(map_kafka_error)?;
        let admin: AdminClient<DefaultClientContext> =
            settings.client_config().create().map_err(map_kafka_error)?;
        Ok(Self {
            metadata_client: Arc::new(metadata_client),
            admin,
            timeout: settings.request_timeout(),
        })
    }

    async fn with_metadata<T, F>(&self, f: F) -> Result<T, BackendError>
    where
        T: Send + 'static,
        F: FnOnce(&BaseConsumer, Metadata) -> T + Send + 'static,
    {
        let client = self.metadata_client.clone();
        let timeout = self.timeout;
        tokio::task::spawn_blocking(move || -> Result<T, BackendError> {
            let metadata = client
                .fetch_metadata(None, timeout)
                .map_err(map_kafka_error)?;
            Ok(f(&client, metadata))
        })
        .await
        .map_err(|e| BackendError::operation(format!("Metadata task failed: {}", e)))?
    }
}

#[async_trait]
impl ClusterAdmin for KafkaClusterAdmin {
    async fn describe_cluster(&self) -> Result<ClusterInfo, BackendError> {
        let timeout = self.timeout;
        self.with_metadata(move |client, metadata| ClusterInfo {
            cluster_id: client.client().fetch_cluster_id(timeout),
            brokers: metadata
                .brokers()
                .iter()
                .map(|b| BrokerInfo {
                    id: b.id(),
                    host: b.host().to_string(),
                    port: b.port(),
                })
                .collect(),
        })
        .await
    }

    /// User topics; internal `__`-prefixed topics are skipped.
    async fn list_topics(&self) -> Result<Vec<TopicInfo>, BackendError> {
        self.with_metadata(|_, metadata| {
            metadata
                .topics()
                .iter()
                .filter(|t| !t.name().starts_with("__"))
                .map(|t| TopicInfo {
                    name: t.name().to_string(),
                    partition_count: t.partitions().len() as i32,
                    replication_factor: t
                        .partitions()
                        .first()
                        .map_or(0, |p| p.replicas().len() as i32),
                })
                .collect()
        })
        .await
    }

    async fn create_topics(&self, topics: &[TopicSpec]) -> Result<Vec<String>, BackendError> {
        let new_topics: Vec<NewTopic<'_>> = topics
            .iter()
            .map(|t| {
                NewTopic::new(
                    &t.name,
                    t.partitions,
                    TopicReplication::Fixed(t.replication_factor),
                )
            })
            .collect();
        let options = AdminOptions::new().operation_timeout(Some(self.timeout));

        let results = self
            .admin
            .create_topics(&new_topics, &options)
            .await
            .map_err(map_kafka_error)?;

        let mut created = Vec::new();
        for result in results {
            match result {
                Ok(name) => created.push(name),
                Err((_, RDKafkaErrorCode::TopicAlreadyExists)) => {}
                Err((name, code)) => {
                    tracing::warn!(topic = %name, "Failed to create topic: {}", code);
                }
            }
        }
        Ok(created)
    }
}
