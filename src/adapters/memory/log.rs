//! InMemoryLog - Topics, partitions and per-group committed offsets.

use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::sync::watch;

use crate::domain::cluster::{
    BrokerInfo, ClusterInfo, ProduceRequest, ProduceResponse, TopicInfo, TopicSpec,
};
use crate::domain::consume::{ConsumedMessage, OffsetPolicy};
use crate::domain::foundation::Timestamp;
use crate::ports::{BackendError, ClusterAdmin, LogConsumer, LogConsumerFactory, LogProducer};

use super::consumer::InMemoryConsumer;

const CLUSTER_ID: &str = "in-memory";
const DEFAULT_PARTITIONS: i32 = 1;

#[derive(Debug)]
struct Topic {
    partitions: Vec<Vec<ConsumedMessage>>,
    replication_factor: i32,
}

impl Topic {
    fn new(partitions: i32, replication_factor: i32) -> Self {
        let count = partitions.max(1) as usize;
        Self {
            partitions: vec![Vec::new(); count],
            replication_factor: replication_factor.max(1),
        }
    }
}

pub(super) struct LogState {
    topics: RwLock<HashMap<String, Topic>>,
    /// Next offset to read, keyed by (group, topic, partition).
    committed: Mutex<HashMap<(String, String, i32), i64>>,
    appended: watch::Sender<u64>,
    unavailable: AtomicBool,
    injected_poll_failure: Mutex<Option<BackendError>>,
    next_partition: AtomicUsize,
}

impl LogState {
    pub(super) fn check_available(&self) -> Result<(), BackendError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(BackendError::connectivity("In-memory log is unavailable"));
        }
        Ok(())
    }

    pub(super) fn take_poll_failure(&self) -> Option<BackendError> {
        self.injected_poll_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub(super) fn changes(&self) -> watch::Receiver<u64> {
        self.appended.subscribe()
    }

    /// Current end offset of every partition of `topic`.
    pub(super) fn end_offsets(&self, topic: &str) -> HashMap<i32, i64> {
        let topics = self.topics.read().unwrap_or_else(PoisonError::into_inner);
        topics
            .get(topic)
            .map(|t| {
                t.partitions
                    .iter()
                    .enumerate()
                    .map(|(p, records)| (p as i32, records.len() as i64))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(super) fn committed(&self, group_id: &str, topic: &str, partition: i32) -> Option<i64> {
        self.committed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(group_id.to_string(), topic.to_string(), partition))
            .copied()
    }

    pub(super) fn commit(&self, group_id: &str, topic: &str, positions: &HashMap<i32, i64>) {
        let mut committed = self.committed.lock().unwrap_or_else(PoisonError::into_inner);
        for (partition, offset) in positions {
            committed.insert((group_id.to_string(), topic.to_string(), *partition), *offset);
        }
    }

    /// Reads up to `max` records starting at `positions`, advancing them.
    ///
    /// `start_of` resolves the position of partitions seen for the first time.
    pub(super) fn read(
        &self,
        topic: &str,
        positions: &mut HashMap<i32, i64>,
        start_of: impl Fn(i32) -> i64,
        max: usize,
    ) -> Vec<ConsumedMessage> {
        let topics = self.topics.read().unwrap_or_else(PoisonError::into_inner);
        let Some(t) = topics.get(topic) else {
            return Vec::new();
        };

        let mut batch = Vec::new();
        for (index, records) in t.partitions.iter().enumerate() {
            let partition = index as i32;
            let position = positions.entry(partition).or_insert_with(|| start_of(partition));
            let from = (*position).max(0) as usize;
            if from >= records.len() {
                continue;
            }
            let take = (max - batch.len()).min(records.len() - from);
            batch.extend_from_slice(&records[from..from + take]);
            *position += take as i64;
            if batch.len() >= max {
                break;
            }
        }
        batch
    }

    fn create_topic(&self, spec: &TopicSpec) -> bool {
        let mut topics = self.topics.write().unwrap_or_else(PoisonError::into_inner);
        if topics.contains_key(&spec.name) {
            return false;
        }
        topics.insert(
            spec.name.clone(),
            Topic::new(spec.partitions, spec.replication_factor),
        );
        true
    }

    fn append(&self, request: &ProduceRequest) -> Result<ProduceResponse, BackendError> {
        let timestamp = Timestamp::now().as_unix_millis();
        let response = {
            let mut topics = self.topics.write().unwrap_or_else(PoisonError::into_inner);
            let topic = topics
                .entry(request.topic.clone())
                .or_insert_with(|| Topic::new(DEFAULT_PARTITIONS, 1));
            let count = topic.partitions.len();

            let partition = match (request.partition, &request.key) {
                (Some(p), _) if p >= 0 && (p as usize) < count => p as usize,
                (Some(p), _) => {
                    return Err(BackendError::operation(format!(
                        "Partition {} does not exist for topic {}",
                        p, request.topic
                    )))
                }
                (None, Some(key)) => {
                    let mut hasher = DefaultHasher::new();
                    key.hash(&mut hasher);
                    (hasher.finish() % count as u64) as usize
                }
                (None, None) => self.next_partition.fetch_add(1, Ordering::Relaxed) % count,
            };

            let records = &mut topic.partitions[partition];
            let offset = records.len() as i64;
            let mut message =
                ConsumedMessage::new(request.topic.clone(), partition as i32, offset, timestamp)
                    .with_value(request.value.clone());
            message.key = request.key.clone();
            message.headers = request.headers.clone().unwrap_or_default();
            records.push(message);

            ProduceResponse {
                topic: request.topic.clone(),
                partition: partition as i32,
                offset,
                timestamp,
            }
        };
        self.appended.send_modify(|version| *version += 1);
        Ok(response)
    }
}

/// Shared handle to an in-memory log. Clones see the same data.
#[derive(Clone)]
pub struct InMemoryLog {
    state: Arc<LogState>,
}

impl Default for InMemoryLog {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLog {
    pub fn new() -> Self {
        let (appended, _) = watch::channel(0);
        Self {
            state: Arc::new(LogState {
                topics: RwLock::new(HashMap::new()),
                committed: Mutex::new(HashMap::new()),
                appended,
                unavailable: AtomicBool::new(false),
                injected_poll_failure: Mutex::new(None),
                next_partition: AtomicUsize::new(0),
            }),
        }
    }

    /// Creates `name` with `partitions` partitions if it does not exist.
    pub fn create_topic(&self, name: &str, partitions: i32) -> bool {
        self.state.create_topic(&TopicSpec::new(name, partitions, 1))
    }

    /// Number of records in one partition.
    pub fn partition_len(&self, topic: &str, partition: i32) -> i64 {
        self.state
            .end_offsets(topic)
            .get(&partition)
            .copied()
            .unwrap_or(0)
    }

    /// Next offset the group will read from `partition`, if it has committed.
    pub fn committed_offset(&self, group_id: &str, topic: &str, partition: i32) -> Option<i64> {
        self.state.committed(group_id, topic, partition)
    }

    /// Simulates losing (or regaining) the cluster.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Makes the next poll by any consumer fail with `error`.
    pub fn fail_next_poll(&self, error: BackendError) {
        *self
            .state
            .injected_poll_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(error);
        self.state.appended.send_modify(|version| *version += 1);
    }
}

impl LogConsumerFactory for InMemoryLog {
    fn create_consumer(
        &self,
        group_id: &str,
        from: OffsetPolicy,
    ) -> Result<Box<dyn LogConsumer>, BackendError> {
        self.state.check_available()?;
        Ok(Box::new(InMemoryConsumer::new(
            self.state.clone(),
            group_id,
            from,
        )))
    }
}

#[async_trait]
impl LogProducer for InMemoryLog {
    async fn send(&self, request: &ProduceRequest) -> Result<ProduceResponse, BackendError> {
        self.state.check_available()?;
        self.state.append(request)
    }
}

#[async_trait]
impl ClusterAdmin for InMemoryLog {
    async fn describe_cluster(&self) -> Result<ClusterInfo, BackendError> {
        self.state.check_available()?;
        Ok(ClusterInfo {
            cluster_id: Some(CLUSTER_ID.to_string()),
            brokers: vec![BrokerInfo {
                id: 0,
                host: "localhost".to_string(),
                port: 9092,
            }],
        })
    }

    async fn list_topics(&self) -> Result<Vec<TopicInfo>, BackendError> {
        self.state.check_available()?;
        let topics = self
            .state
            .topics
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(topics
            .iter()
            .map(|(name, topic)| TopicInfo {
                name: name.clone(),
                partition_count: topic.partitions.len() as i32,
                replication_factor: topic.replication_factor,
            })
            .collect())
    }

    async fn create_topics(&self, topics: &[TopicSpec]) -> Result<Vec<String>, BackendError> {
        self.state.check_available()?;
        Ok(topics
            .iter()
            .filter(|spec| self.state.create_topic(spec))
            .map(|spec| spec.name.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn produce_auto_creates_topic_and_assigns_sequential_offsets() {
        let log = InMemoryLog::new();

        let first = log.send(&ProduceRequest::new("orders", "a")).await.unwrap();
        let second = log.send(&ProduceRequest::new("orders", "b")).await.unwrap();

        assert_eq!((first.partition, first.offset), (0, 0));
        assert_eq!((second.partition, second.offset), (0, 1));
        assert_eq!(log.partition_len("orders", 0), 2);
    }

    #[tokio::test]
    async fn keyed_records_stay_on_one_partition() {
        let log = InMemoryLog::new();
        log.create_topic("orders", 4);

        let mut partitions = Vec::new();
        for value in ["a", "b", "c"] {
            let mut req = ProduceRequest::new("orders", value);
            req.key = Some("customer-1".to_string());
            partitions.push(log.send(&req).await.unwrap().partition);
        }

        assert!(partitions.windows(2).all(|w| w[0] == w[1]));
    }

    #[tokio::test]
    async fn explicit_partition_must_exist() {
        let log = InMemoryLog::new();
        log.create_topic("orders", 2);

        let mut req = ProduceRequest::new("orders", "v");
        req.partition = Some(5);
        let err = log.send(&req).await.unwrap_err();

        assert!(matches!(err, BackendError::Operation(_)));
    }

    #[tokio::test]
    async fn create_topics_reports_only_new_topics() {
        let log = InMemoryLog::new();
        log.create_topic("orders", 1);

        let created = log
            .create_topics(&[TopicSpec::new("orders", 1, 1), TopicSpec::new("audit", 3, 2)])
            .await
            .unwrap();
        assert_eq!(created, vec!["audit".to_string()]);

        let mut topics = log.list_topics().await.unwrap();
        topics.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(topics[0].name, "audit");
        assert_eq!(topics[0].partition_count, 3);
        assert_eq!(topics[0].replication_factor, 2);
    }

    #[tokio::test]
    async fn unavailable_log_fails_with_connectivity_errors() {
        let log = InMemoryLog::new();
        log.set_unavailable(true);

        assert!(matches!(
            log.describe_cluster().await,
            Err(BackendError::Connectivity(_))
        ));
        assert!(matches!(
            log.send(&ProduceRequest::new("orders", "v")).await,
            Err(BackendError::Connectivity(_))
        ));
        assert!(log.create_consumer("g", OffsetPolicy::Earliest).is_err());

        log.set_unavailable(false);
        assert!(log.describe_cluster().await.is_ok());
    }
}
