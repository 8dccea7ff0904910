//! Bounded retention of recently consumed records.

use std::collections::VecDeque;

use super::ConsumedMessage;

/// FIFO buffer that evicts its oldest record once `capacity` is reached.
#[derive(Debug, Clone)]
pub struct MessageBuffer {
    capacity: usize,
    records: VecDeque<ConsumedMessage>,
}

impl MessageBuffer {
    /// Creates an empty buffer. A zero capacity is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            records: VecDeque::with_capacity(capacity.min(1024)),
        }
    }

    /// Appends a record, evicting the oldest ones while over capacity.
    pub fn push(&mut self, record: ConsumedMessage) {
        while self.records.len() >= self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Up to `limit` most recent records, newest first.
    pub fn newest(&self, limit: usize) -> Vec<ConsumedMessage> {
        self.records.iter().rev().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
