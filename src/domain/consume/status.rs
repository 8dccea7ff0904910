//! Point-in-time status view of a consume session.

use serde::Serialize;

use crate::domain::foundation::{SessionId, Timestamp};

use super::{ConsumeSession, ConsumeSessionState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumeSessionStatus {
    pub session_id: SessionId,
    pub topic: String,
    pub state: ConsumeSessionState,
    pub last_consumed_at: Option<Timestamp>,
    pub last_activity_at: Timestamp,
    pub buffer_size: usize,
    pub subscriber_count: usize,
}

impl ConsumeSessionStatus {
    pub fn from_session(session: &ConsumeSession, buffer_size: usize, subscriber_count: usize) -> Self {
        Self {
            session_id: session.id.clone(),
            topic: session.topic.clone(),
            state: session.state,
            last_consumed_at: session.last_consumed_at,
            last_activity_at: session.last_activity_at(),
            buffer_size,
            subscriber_count,
        }
    }
}
