//! Topic metadata and topic declarations.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Summary of one topic as reported by the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicInfo {
    pub name: String,
    pub partition_count: i32,
    pub replication_factor: i32,
}

/// A topic that should exist, parsed from `name[:partitions[:replication]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSpec {
    pub name: String,
    pub partitions: i32,
    pub replication_factor: i32,
}

impl TopicSpec {
    pub fn new(name: impl Into<String>, partitions: i32, replication_factor: i32) -> Self {
        Self {
            name: name.into(),
            partitions,
            replication_factor,
        }
    }

    /// Parses a comma-separated list of declarations, skipping blanks.
    pub fn parse_list(list: &str) -> Result<Vec<TopicSpec>, ValidationError> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl FromStr for TopicSpec {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split(':');
        let name = parts.next().unwrap_or_default().trim();
        if name.is_empty() {
            return Err(ValidationError::empty_field("topic"));
        }

        let parse_count = |field: &str, raw: Option<&str>| -> Result<i32, ValidationError> {
            match raw {
                None => Ok(1),
                Some(raw) => match raw.trim().parse::<i32>() {
                    Ok(n) if n >= 1 => Ok(n),
                    _ => Err(ValidationError::invalid_format(
                        field,
                        format!("expected a positive integer, got '{}'", raw),
                    )),
                },
            }
        };

        let partitions = parse_count("partitions", parts.next())?;
        let replication_factor = parse_count("replication_factor", parts.next())?;
        if parts.next().is_some() {
            return Err(ValidationError::invalid_format(
                "topic",
                format!("expected name[:partitions[:replication]], got '{}'", s),
            ));
        }

        Ok(Self::new(name, partitions, replication_factor))
    }
}
