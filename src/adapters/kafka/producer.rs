//! Single-record writes over `FutureProducer`.

use async_trait::async_trait;
use rdkafka::message::{Header, OwnedHeaders};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::domain::cluster::{ProduceRequest, ProduceResponse};
use crate::domain::foundation::Timestamp;
use crate::ports::{BackendError, LogProducer};

use super::client_config::{map_kafka_error, KafkaClientSettings};

pub struct KafkaLogProducer {
    producer: FutureProducer,
    timeout: Duration,
}

impl KafkaLogProducer {
    pub fn new(settings: &KafkaClientSettings) -> Result<Self, BackendError> {
        let producer: FutureProducer = settings
            .producer_config()
            .create()
            .map_err(map_kafka_error)?;
        Ok(Self {
            producer,
            timeout: settings.request_timeout(),
        })
    }
}

fn to_owned_headers(headers: &BTreeMap<String, String>) -> OwnedHeaders {
    headers.iter().fold(OwnedHeaders::new(), |acc, (key, value)| {
        acc.insert(Header {
            key: key.as_str(),
            value: Some(value.as_str()),
        })
    })
}

#[async_trait]
impl LogProducer for KafkaLogProducer {
    async fn send(&self, request: &ProduceRequest) -> Result<ProduceResponse, BackendError> {
        let timestamp = Timestamp::now().as_unix_millis();

        let mut record = FutureRecord::<str, str>::to(&request.topic)
            .payload(request.value.as_str())
            .timestamp(timestamp);
        if let Some(ref key) = request.key {
            record = record.key(key.as_str());
        }
        if let Some(partition) = request.partition {
            record = record.partition(partition);
        }
        if let Some(ref headers) = request.headers {
            record = record.headers(to_owned_headers(headers));
        }

        let (partition, offset) = self
            .producer
            .send(record, Timeout::After(self.timeout))
            .await
            .map_err(|(e, _)| map_kafka_error(e))?;

        Ok(ProduceResponse {
            topic: request.topic.clone(),
            partition,
            offset,
            timestamp,
        })
    }
}
