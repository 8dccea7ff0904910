//! ConsumeSession entity and its offset policy.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{SessionId, Timestamp, ValidationError};

use super::ConsumeSessionState;

/// Where a fresh consumer group starts reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OffsetPolicy {
    Earliest,
    #[default]
    Latest,
}

impl OffsetPolicy {
    /// Value for the `auto.offset.reset` client property.
    pub fn as_reset_value(&self) -> &'static str {
        match self {
            OffsetPolicy::Earliest => "earliest",
            OffsetPolicy::Latest => "latest",
        }
    }
}

impl fmt::Display for OffsetPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OffsetPolicy::Earliest => write!(f, "EARLIEST"),
            OffsetPolicy::Latest => write!(f, "LATEST"),
        }
    }
}

impl FromStr for OffsetPolicy {
    type Err = ValidationError;

    /// Case-insensitive parse of `EARLIEST` / `LATEST`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EARLIEST" => Ok(OffsetPolicy::Earliest),
            "LATEST" => Ok(OffsetPolicy::Latest),
            _ => Err(ValidationError::invalid_format(
                "from",
                "Invalid 'from' value. Must be EARLIEST or LATEST",
            )),
        }
    }
}

/// A caller-initiated consumption context against one topic.
///
/// Metadata only; the buffered records live next to it in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumeSession {
    pub id: SessionId,
    pub topic: String,
    pub group_id: String,
    pub from: OffsetPolicy,
    pub max_buffer_size: usize,
    pub state: ConsumeSessionState,
    pub last_consumed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    /// When the session entered STOPPED or ERROR.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminated_at: Option<Timestamp>,
}

impl ConsumeSession {
    /// Creates a RUNNING session with no consumed records yet.
    pub fn new(
        id: SessionId,
        topic: impl Into<String>,
        group_id: impl Into<String>,
        from: OffsetPolicy,
        max_buffer_size: usize,
    ) -> Self {
        Self {
            id,
            topic: topic.into(),
            group_id: group_id.into(),
            from,
            max_buffer_size,
            state: ConsumeSessionState::Running,
            last_consumed_at: None,
            created_at: Timestamp::now(),
            terminated_at: None,
        }
    }

    /// Returns a copy with a different creation time.
    pub fn with_created_at(mut self, created_at: Timestamp) -> Self {
        self.created_at = created_at;
        self
    }

    /// Most recent moment anything happened on this session.
    pub fn last_activity_at(&self) -> Timestamp {
        self.last_consumed_at.unwrap_or(self.created_at)
    }

    /// Sets the state, stamping `terminated_at` on the first move into a
    /// terminal state.
    pub fn set_state(&mut self, state: ConsumeSessionState) {
        if !state.is_live() && self.terminated_at.is_none() {
            self.terminated_at = Some(Timestamp::now());
        }
        self.state = state;
    }

    /// Termination time of a STOPPED or ERROR session; `None` while live.
    ///
    /// Sessions placed in a terminal state without [`set_state`](Self::set_state)
    /// fall back to their last activity.
    pub fn terminated_since(&self) -> Option<Timestamp> {
        if self.state.is_live() {
            return None;
        }
        Some(self.terminated_at.unwrap_or_else(|| self.last_activity_at()))
    }

    /// True when the session is live and has been quiet since `cutoff`.
    pub fn is_idle_since(&self, cutoff: &Timestamp) -> bool {
        self.state.is_live() && self.last_activity_at().is_before(cutoff)
    }
}
