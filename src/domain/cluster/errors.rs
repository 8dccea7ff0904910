//! Cluster operation errors.

use thiserror::Error;

use crate::domain::foundation::{ErrorCode, ValidationError};
use crate::ports::BackendError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClusterError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl ClusterError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ClusterError::Validation(_) => ErrorCode::ValidationFailed,
            ClusterError::Backend(BackendError::Connectivity(_)) => ErrorCode::ClusterUnavailable,
            ClusterError::Backend(_) => ErrorCode::BackendError,
        }
    }
}
