//! Auth service errors.

use thiserror::Error;

use crate::{rest::RestError, storage::StorageError};

#[derive(Debug, Error)]
pub enum AuthServiceError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("missing required data: {0}")]
    MissingRequiredData(&'static str),

    #[error("no backend configured for authentication")]
    Unavailable,

    #[error("backend error")]
    Rest(#[source] RestError),

    #[error("session storage error")]
    Storage(#[from] StorageError),
}

impl From<RestError> for AuthServiceError {
    fn from(error: RestError) -> Self {
        match error {
            RestError::AccessDenied(_) => Self::InvalidCredentials,
            RestError::Status { status: 400, .. } => Self::InvalidCredentials,
            other => Self::Rest(other),
        }
    }
}
