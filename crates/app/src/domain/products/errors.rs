//! Products service errors.

use scancart::fixtures::FixtureError;
use thiserror::Error;

use crate::rest::RestError;

#[derive(Debug, Error)]
pub enum ProductsServiceError {
    #[error("product not found")]
    NotFound,

    #[error("missing required data: {0}")]
    MissingRequiredData(&'static str),

    #[error("catalog backend error")]
    Rest(#[from] RestError),

    #[error("catalog fixture error")]
    Fixture(#[from] FixtureError),
}

impl ProductsServiceError {
    /// Whether the backend refused the request for the current identity.
    #[must_use]
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::Rest(error) if error.is_access_denied())
    }
}
