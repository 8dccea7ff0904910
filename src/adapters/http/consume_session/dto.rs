//! Request DTOs for consume-session endpoints.
//!
//! Responses serialize the domain types directly inside `ApiResponse`.

use serde::Deserialize;

use crate::application::consume_session::StartSessionCommand;
use crate::domain::consume::OffsetPolicy;
use crate::domain::foundation::ValidationError;

/// Body of `POST /api/consume-sessions`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub topic: String,
    #[serde(default)]
    pub group_id: Option<String>,
    /// `EARLIEST` or `LATEST`, case-insensitive
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub max_buffer_size: Option<i64>,
}

impl CreateSessionRequest {
    pub fn into_command(self) -> Result<StartSessionCommand, ValidationError> {
        let from = match self.from.as_deref() {
            Some(raw) => raw.parse::<OffsetPolicy>()?,
            None => OffsetPolicy::Latest,
        };

        let mut cmd = StartSessionCommand::new(self.topic).from(from);
        if let Some(group_id) = self.group_id {
            cmd = cmd.group_id(group_id);
        }
        if let Some(size) = self.max_buffer_size {
            // Negative sizes fall through to the service's range check.
            cmd = cmd.max_buffer_size(usize::try_from(size).unwrap_or(0));
        }
        Ok(cmd)
    }
}

/// Query of `GET /api/consume-sessions/:id/messages`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagesQuery {
    pub limit: Option<i64>,
}

impl MessagesQuery {
    pub fn resolve_limit(&self, default_limit: usize) -> Result<usize, ValidationError> {
        match self.limit {
            None => Ok(default_limit),
            Some(limit) => usize::try_from(limit)
                .map_err(|_| ValidationError::out_of_range("limit", 0, i64::MAX, limit)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_session_request_deserializes_camel_case() {
        let json = r#"{"topic":"orders","groupId":"g1","from":"earliest","maxBufferSize":5}"#;
        let req: CreateSessionRequest = serde_json::from_str(json).unwrap();
        let cmd = req.into_command().unwrap();

        assert_eq!(cmd.topic, "orders");
        assert_eq!(cmd.group_id.as_deref(), Some("g1"));
        assert_eq!(cmd.from, OffsetPolicy::Earliest);
        assert_eq!(cmd.max_buffer_size, Some(5));
    }

    #[test]
    fn from_defaults_to_latest() {
        let req: CreateSessionRequest = serde_json::from_str(r#"{"topic":"orders"}"#).unwrap();
        let cmd = req.into_command().unwrap();
        assert_eq!(cmd.from, OffsetPolicy::Latest);
        assert_eq!(cmd.max_buffer_size, None);
    }

    #[test]
    fn unknown_from_is_rejected() {
        let req: CreateSessionRequest =
            serde_json::from_str(r#"{"topic":"orders","from":"middle"}"#).unwrap();
        let err = req.into_command().unwrap_err();
        assert_eq!(err.field(), "from");
    }

    #[test]
    fn negative_buffer_size_becomes_zero() {
        let req: CreateSessionRequest =
            serde_json::from_str(r#"{"topic":"orders","maxBufferSize":-3}"#).unwrap();
        assert_eq!(req.into_command().unwrap().max_buffer_size, Some(0));
    }

    #[test]
    fn messages_limit_defaults_and_rejects_negative() {
        assert_eq!(MessagesQuery::default().resolve_limit(100).unwrap(), 100);
        assert_eq!(MessagesQuery { limit: Some(3) }.resolve_limit(100).unwrap(), 3);
        assert!(MessagesQuery { limit: Some(-1) }.resolve_limit(100).is_err());
    }
}
