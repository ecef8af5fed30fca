//! Vision API errors.

use reqwest::StatusCode;
use thiserror::Error;

use crate::retry::Transient;

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("vision request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("vision API returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("vision API rejected the image ({code}): {message}")]
    Api { code: i32, message: String },

    #[error("vision response is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("vision response contained no result for the image")]
    EmptyResponse,

    #[error("vision API key is not configured")]
    MissingApiKey,
}

impl Transient for VisionError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Http(error) => error.is_timeout() || error.is_connect(),
            Self::Status { status, .. } => {
                *status >= 500 || *status == StatusCode::TOO_MANY_REQUESTS.as_u16()
            }
            Self::Api { .. } | Self::Decode(_) | Self::EmptyResponse | Self::MissingApiKey => false,
        }
    }
}
