//! Group consumer over `StreamConsumer`.

use async_trait::async_trait;
use futures::FutureExt;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::{BorrowedMessage, Headers, Message};
use rdkafka::Offset;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::consume::{ConsumedMessage, OffsetPolicy};
use crate::domain::foundation::Timestamp;
use crate::ports::{BackendError, LogConsumer, LogConsumerFactory};

use super::client_config::{map_kafka_error, KafkaClientSettings};

/// Records drained from the local queue after the first one arrives.
const MAX_BATCH: usize = 500;

const SEEK_TIMEOUT: Duration = Duration::from_secs(1);

pub struct KafkaLogConsumerFactory {
    settings: Arc<KafkaClientSettings>,
}

impl KafkaLogConsumerFactory {
    pub fn new(settings: Arc<KafkaClientSettings>) -> Self {
        Self { settings }
    }
}

impl LogConsumerFactory for KafkaLogConsumerFactory {
    fn create_consumer(
        &self,
        group_id: &str,
        from: OffsetPolicy,
    ) -> Result<Box<dyn LogConsumer>, BackendError> {
        let consumer: StreamConsumer = self
            .settings
            .consumer_config(group_id, from)
            .create()
            .map_err(map_kafka_error)?;
        Ok(Box::new(KafkaLogConsumer {
            consumer,
            group_id: group_id.to_string(),
            paused: false,
        }))
    }
}

/// Pausing applies to the assignment at the time of the call, so while
/// paused every poll re-pauses the current assignment and rewinds any record
/// that slipped through. Offsets are stored only for returned records.
pub struct KafkaLogConsumer {
    consumer: StreamConsumer,
    group_id: String,
    paused: bool,
}

impl KafkaLogConsumer {
    fn pause_assignment(&self) -> Result<(), BackendError> {
        let assignment = self.consumer.assignment().map_err(map_kafka_error)?;
        self.consumer.pause(&assignment).map_err(map_kafka_error)
    }

    /// Keeps serving rebalances while paused without handing out records.
    async fn poll_paused(&mut self, timeout: Duration) -> Result<Vec<ConsumedMessage>, BackendError> {
        self.pause_assignment()?;
        let rewind = match tokio::time::timeout(timeout, self.consumer.recv()).await {
            Err(_) => return Ok(Vec::new()),
            Ok(received) => received
                .map(|m| (m.topic().to_string(), m.partition(), m.offset()))
                .map_err(map_kafka_error)?,
        };

        let (topic, partition, offset) = rewind;
        self.pause_assignment()?;
        self.consumer
            .seek(&topic, partition, Offset::Offset(offset), SEEK_TIMEOUT)
            .map_err(map_kafka_error)?;
        tracing::debug!(
            group_id = %self.group_id,
            topic = %topic,
            partition,
            offset,
            "Rewound record fetched while paused"
        );
        Ok(Vec::new())
    }

    fn accept(&self, message: &BorrowedMessage<'_>) -> ConsumedMessage {
        if let Err(e) = self.consumer.store_offset_from_message(message) {
            tracing::warn!(group_id = %self.group_id, "Failed to store offset: {}", e);
        }
        to_consumed(message)
    }
}

#[async_trait]
impl LogConsumer for KafkaLogConsumer {
    fn subscribe(&mut self, topic: &str) -> Result<(), BackendError> {
        self.consumer.subscribe(&[topic]).map_err(map_kafka_error)?;
        tracing::debug!(group_id = %self.group_id, topic = %topic, "Kafka consumer subscribed");
        Ok(())
    }

    async fn poll(&mut self, timeout: Duration) -> Result<Vec<ConsumedMessage>, BackendError> {
        if self.paused {
            return self.poll_paused(timeout).await;
        }

        let first = match tokio::time::timeout(timeout, self.consumer.recv()).await {
            Err(_) => return Ok(Vec::new()),
            Ok(received) => received.map(|m| self.accept(&m)).map_err(map_kafka_error)?,
        };

        let mut batch = vec![first];
        while batch.len() < MAX_BATCH {
            match self.consumer.recv().now_or_never() {
                Some(Ok(m)) => batch.push(self.accept(&m)),
                Some(Err(e)) => {
                    tracing::warn!(group_id = %self.group_id, "Error while draining batch: {}", e);
                    break;
                }
                None => break,
            }
        }
        Ok(batch)
    }

    fn pause(&mut self) -> Result<(), BackendError> {
        self.paused = true;
        self.pause_assignment()
    }

    fn resume(&mut self) -> Result<(), BackendError> {
        self.paused = false;
        let assignment = self.consumer.assignment().map_err(map_kafka_error)?;
        self.consumer.resume(&assignment).map_err(map_kafka_error)
    }

    fn close(&mut self) {
        self.consumer.unsubscribe();
        tracing::debug!(group_id = %self.group_id, "Kafka consumer closed");
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn to_consumed(message: &BorrowedMessage<'_>) -> ConsumedMessage {
    let timestamp = message
        .timestamp()
        .to_millis()
        .unwrap_or_else(|| Timestamp::now().as_unix_millis());

    let mut consumed = ConsumedMessage::new(
        message.topic(),
        message.partition(),
        message.offset(),
        timestamp,
    );
    consumed.key = message.key().map(lossy);
    consumed.value = message.payload().map(lossy);
    if let Some(headers) = message.headers() {
        for header in headers.iter() {
            consumed
                .headers
                .insert(header.key.to_string(), header.value.map(lossy).unwrap_or_default());
        }
    }
    consumed
}
