//! InMemoryConsumer - A consumer-group member reading from the in-memory log.
//!
//! Positions resolve per partition the first time it is read: the group's
//! committed offset if it has one, otherwise the offset policy. `LATEST` is
//! pinned to the end offsets observed at subscribe time. Offsets are
//! committed after every non-empty fetch.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::domain::consume::{ConsumedMessage, OffsetPolicy};
use crate::ports::{BackendError, LogConsumer};

use super::log::LogState;

const MAX_BATCH: usize = 500;

pub struct InMemoryConsumer {
    state: Arc<LogState>,
    group_id: String,
    from: OffsetPolicy,
    topic: Option<String>,
    end_offsets_at_subscribe: HashMap<i32, i64>,
    positions: HashMap<i32, i64>,
    paused: bool,
    changes: watch::Receiver<u64>,
}

impl InMemoryConsumer {
    pub(super) fn new(state: Arc<LogState>, group_id: &str, from: OffsetPolicy) -> Self {
        let changes = state.changes();
        Self {
            state,
            group_id: group_id.to_string(),
            from,
            topic: None,
            end_offsets_at_subscribe: HashMap::new(),
            positions: HashMap::new(),
            paused: false,
            changes,
        }
    }

    fn fetch(&mut self, topic: &str) -> Vec<ConsumedMessage> {
        let state = &self.state;
        let group_id = &self.group_id;
        let from = self.from;
        let end_offsets = &self.end_offsets_at_subscribe;

        let batch = state.read(
            topic,
            &mut self.positions,
            |partition| {
                state
                    .committed(group_id, topic, partition)
                    .unwrap_or_else(|| match from {
                        OffsetPolicy::Earliest => 0,
                        OffsetPolicy::Latest => end_offsets.get(&partition).copied().unwrap_or(0),
                    })
            },
            MAX_BATCH,
        );
        if !batch.is_empty() {
            state.commit(group_id, topic, &self.positions);
        }
        batch
    }
}

#[async_trait]
impl LogConsumer for InMemoryConsumer {
    fn subscribe(&mut self, topic: &str) -> Result<(), BackendError> {
        self.state.check_available()?;
        self.end_offsets_at_subscribe = self.state.end_offsets(topic);
        self.positions.clear();
        self.topic = Some(topic.to_string());
        tracing::debug!(group_id = %self.group_id, topic = %topic, "In-memory consumer subscribed");
        Ok(())
    }

    async fn poll(&mut self, timeout: Duration) -> Result<Vec<ConsumedMessage>, BackendError> {
        let Some(topic) = self.topic.clone() else {
            return Err(BackendError::operation("Consumer is not subscribed"));
        };
        let deadline = Instant::now() + timeout;

        loop {
            let _ = self.changes.borrow_and_update();
            if let Some(error) = self.state.take_poll_failure() {
                return Err(error);
            }
            if !self.paused {
                let batch = self.fetch(&topic);
                if !batch.is_empty() {
                    return Ok(batch);
                }
            }
            match tokio::time::timeout_at(deadline, self.changes.changed()).await {
                Ok(Ok(())) => continue,
                Ok(Err(_)) | Err(_) => return Ok(Vec::new()),
            }
        }
    }

    fn pause(&mut self) -> Result<(), BackendError> {
        self.paused = true;
        Ok(())
    }

    fn resume(&mut self) -> Result<(), BackendError> {
        self.paused = false;
        Ok(())
    }

    fn close(&mut self) {
        self.topic = None;
        self.positions.clear();
    }
}
