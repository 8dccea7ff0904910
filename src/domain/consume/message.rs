//! A single record read from the log.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::foundation::Timestamp;

/// Record as delivered to the buffer and to live viewers.
///
/// Keys, values and header values are decoded as UTF-8 (lossily).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumedMessage {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    /// Epoch milliseconds as reported by the log.
    pub timestamp: i64,
    pub key: Option<String>,
    pub value: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl ConsumedMessage {
    pub fn new(topic: impl Into<String>, partition: i32, offset: i64, timestamp: i64) -> Self {
        Self {
            topic: topic.into(),
            partition,
            offset,
            timestamp,
            key: None,
            value: None,
            headers: BTreeMap::new(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Record timestamp as a [`Timestamp`].
    pub fn consumed_at(&self) -> Timestamp {
        Timestamp::from_unix_millis(self.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_camel_case_and_nulls() {
        let msg = ConsumedMessage::new("orders", 2, 41, 1_700_000_000_000).with_value("{}");
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["topic"], "orders");
        assert_eq!(json["partition"], 2);
        assert_eq!(json["offset"], 41);
        assert_eq!(json["timestamp"], 1_700_000_000_000_i64);
        assert!(json["key"].is_null());
        assert_eq!(json["value"], "{}");
        assert!(json["headers"].as_object().unwrap().is_empty());
    }

    #[test]
    fn consumed_at_uses_record_timestamp() {
        let msg = ConsumedMessage::new("orders", 0, 0, 1_234);
        assert_eq!(msg.consumed_at().as_unix_millis(), 1_234);
    }
}
