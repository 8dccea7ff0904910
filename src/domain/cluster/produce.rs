//! Single-record produce request and its delivery report.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::foundation::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProduceRequest {
    pub topic: String,
    #[serde(default)]
    pub key: Option<String>,
    pub value: String,
    #[serde(default)]
    pub partition: Option<i32>,
    #[serde(default)]
    pub headers: Option<BTreeMap<String, String>>,
}

impl ProduceRequest {
    pub fn new(topic: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            key: None,
            value: value.into(),
            partition: None,
            headers: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.topic.trim().is_empty() {
            return Err(ValidationError::empty_field("topic"));
        }
        if let Some(partition) = self.partition {
            if partition < 0 {
                return Err(ValidationError::out_of_range(
                    "partition",
                    0,
                    i32::MAX as i64,
                    partition as i64,
                ));
            }
        }
        Ok(())
    }
}

/// Where the record landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProduceResponse {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub timestamp: i64,
}
