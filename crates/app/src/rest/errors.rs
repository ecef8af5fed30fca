//! Backend REST errors.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::retry::Transient;

/// PostgreSQL `insufficient_privilege`, reported when a row-level security
/// policy rejects a write.
pub const INSUFFICIENT_PRIVILEGE: &str = "42501";

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum RestError {
    /// An HTTP transport error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend refused access to the requested rows.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// The backend returned a non-2xx response.
    #[error("backend returned {status}: {message}")]
    Status {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// The response body could not be decoded.
    #[error("failed to decode backend response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl RestError {
    /// Postgres/PostgREST error code, when the backend supplied one.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Status { code, .. } => code.as_deref(),
            Self::AccessDenied(_) => Some(INSUFFICIENT_PRIVILEGE),
            Self::Http(_) | Self::Decode(_) => None,
        }
    }

    #[must_use]
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::AccessDenied(_))
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(error) => error.status().map(|status| status.as_u16()),
            Self::AccessDenied(_) | Self::Decode(_) => None,
        }
    }
}

impl Transient for RestError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Http(error) => error.is_timeout() || error.is_connect(),
            Self::Status { status, .. } => {
                *status >= 500 || *status == StatusCode::TOO_MANY_REQUESTS.as_u16()
            }
            Self::AccessDenied(_) | Self::Decode(_) => false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,

    #[serde(default, alias = "msg", alias = "error_description")]
    message: Option<String>,

    #[serde(default)]
    error: Option<String>,
}

/// Build the error for a non-2xx response from its status and body text.
pub(crate) fn from_response(status: StatusCode, body: &str) -> RestError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();

    let message = parsed
        .message
        .or(parsed.error)
        .unwrap_or_else(|| body.trim().to_string());

    let denied = matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
        || parsed.code.as_deref() == Some(INSUFFICIENT_PRIVILEGE);

    if denied {
        return RestError::AccessDenied(message);
    }

    RestError::Status {
        status: status.as_u16(),
        code: parsed.code,
        message,
    }
}
