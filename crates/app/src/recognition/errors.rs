//! Recognition errors.

use thiserror::Error;

use crate::{domain::products::ProductsServiceError, vision::VisionError};

#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("image recognition failed")]
    Vision(#[from] VisionError),

    #[error("catalog unavailable")]
    Catalog(#[from] ProductsServiceError),
}
