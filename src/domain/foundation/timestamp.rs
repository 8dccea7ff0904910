//! UTC instants used for session activity and record times.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A UTC instant. Serializes as RFC 3339.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Record timestamps arrive as epoch milliseconds. Values chrono cannot
    /// represent map to the epoch.
    pub fn from_unix_millis(millis: i64) -> Self {
        match Utc.timestamp_millis_opt(millis).single() {
            Some(instant) => Self(instant),
            None => Self(DateTime::<Utc>::UNIX_EPOCH),
        }
    }

    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    pub fn as_unix_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    pub fn is_before(&self, other: &Timestamp) -> bool {
        self < other
    }

    /// `self - age`, saturating at the earliest representable instant.
    pub fn minus(&self, age: Duration) -> Self {
        let earlier = chrono::Duration::from_std(age)
            .ok()
            .and_then(|delta| self.0.checked_sub_signed(delta));
        Self(earlier.unwrap_or(DateTime::<Utc>::MIN_UTC))
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}
