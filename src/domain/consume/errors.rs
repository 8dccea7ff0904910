//! Consume-session error types.

use thiserror::Error;

use crate::domain::foundation::{ErrorCode, SessionId, ValidationError};
use crate::ports::BackendError;

use super::ConsumeSessionState;

/// Errors surfaced by consume-session operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsumeSessionError {
    /// Session was not found.
    #[error("Session {0} not found")]
    NotFound(SessionId),

    /// Operation not allowed in the session's current state.
    #[error("Cannot {operation} session {id}: session is {state}")]
    InvalidState {
        id: SessionId,
        state: ConsumeSessionState,
        operation: &'static str,
    },

    /// A session with this id is already registered.
    #[error("Session {0} already exists")]
    AlreadyExists(SessionId),

    /// Request parameters failed validation.
    #[error("Validation failed for '{field}': {message}")]
    Validation { field: String, message: String },

    /// The log backend rejected or could not serve the request.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl ConsumeSessionError {
    pub fn not_found(id: SessionId) -> Self {
        ConsumeSessionError::NotFound(id)
    }

    pub fn invalid_state(id: SessionId, state: ConsumeSessionState, operation: &'static str) -> Self {
        ConsumeSessionError::InvalidState { id, state, operation }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ConsumeSessionError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ConsumeSessionError::NotFound(_) => ErrorCode::SessionNotFound,
            ConsumeSessionError::InvalidState { .. } => ErrorCode::InvalidStateTransition,
            ConsumeSessionError::AlreadyExists(_) => ErrorCode::SessionAlreadyExists,
            ConsumeSessionError::Validation { .. } => ErrorCode::ValidationFailed,
            ConsumeSessionError::Backend(BackendError::Connectivity(_)) => {
                ErrorCode::ClusterUnavailable
            }
            ConsumeSessionError::Backend(_) => ErrorCode::BackendError,
        }
    }
}

impl From<ValidationError> for ConsumeSessionError {
    fn from(err: ValidationError) -> Self {
        ConsumeSessionError::Validation {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}
