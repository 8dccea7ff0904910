//! ClusterService - Metadata queries, single-record produce and topic bootstrap.

use std::sync::Arc;

use crate::domain::cluster::{
    ClusterError, ClusterInfo, ProduceRequest, ProduceResponse, TopicInfo, TopicSpec,
};
use crate::ports::{ClusterAdmin, LogProducer};

pub struct ClusterService {
    admin: Arc<dyn ClusterAdmin>,
    producer: Arc<dyn LogProducer>,
}

impl ClusterService {
    pub fn new(admin: Arc<dyn ClusterAdmin>, producer: Arc<dyn LogProducer>) -> Self {
        Self { admin, producer }
    }

    pub async fn describe_cluster(&self) -> Result<ClusterInfo, ClusterError> {
        let info = self.admin.describe_cluster().await.map_err(|e| {
            tracing::warn!("Failed to describe cluster: {}", e);
            e
        })?;
        Ok(info)
    }

    /// Topics sorted by name.
    pub async fn list_topics(&self) -> Result<Vec<TopicInfo>, ClusterError> {
        let mut topics = self.admin.list_topics().await.map_err(|e| {
            tracing::warn!("Failed to list topics: {}", e);
            e
        })?;
        topics.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(topics)
    }

    pub async fn produce(&self, request: ProduceRequest) -> Result<ProduceResponse, ClusterError> {
        request.validate()?;
        let response = self.producer.send(&request).await.map_err(|e| {
            tracing::error!(topic = %request.topic, "Failed to produce message: {}", e);
            e
        })?;
        tracing::debug!(
            topic = %response.topic,
            partition = response.partition,
            offset = response.offset,
            "Produced message"
        );
        Ok(response)
    }

    /// Creates the declared topics that do not exist yet.
    ///
    /// Failures are logged and swallowed so a missing cluster does not stop
    /// the server from starting.
    pub async fn ensure_topics(&self, specs: &[TopicSpec]) -> Vec<String> {
        if specs.is_empty() {
            tracing::info!("No initial topics configured");
            return Vec::new();
        }
        match self.admin.create_topics(specs).await {
            Ok(created) if created.is_empty() => {
                tracing::info!("All initial topics already exist");
                created
            }
            Ok(created) => {
                tracing::info!(topics = ?created, "Created initial topics");
                created
            }
            Err(e) => {
                tracing::warn!("Failed to initialize topics: {}", e);
                Vec::new()
            }
        }
    }
}
