//! Carts service errors.

use thiserror::Error;

use crate::{
    domain::{carts::sync::InvalidTransition, products::ProductsServiceError},
    rest::RestError,
    storage::StorageError,
};

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const NOT_NULL_VIOLATION: &str = "23502";
const CHECK_VIOLATION: &str = "23514";

#[derive(Debug, Error)]
pub enum CartsServiceError {
    #[error("cart not found")]
    NotFound,

    #[error("cart item not found")]
    ItemNotFound,

    #[error("cart already exists")]
    AlreadyExists,

    #[error("related resource not found")]
    InvalidReference,

    #[error("access denied for the current user")]
    AccessDenied,

    #[error("cannot check out an empty cart")]
    EmptyCart,

    #[error("cart is not active")]
    NotActive,

    #[error("product added again too quickly")]
    TooFrequent,

    #[error("invalid quantity")]
    InvalidQuantity,

    #[error("missing required data: {0}")]
    MissingRequiredData(&'static str),

    #[error("cart sync error")]
    Sync(#[from] InvalidTransition),

    #[error("cart backend error")]
    Rest(#[source] RestError),

    #[error("local cart storage error")]
    Storage(#[from] StorageError),

    #[error("product lookup failed")]
    Products(#[from] ProductsServiceError),
}

impl From<RestError> for CartsServiceError {
    fn from(error: RestError) -> Self {
        if error.is_access_denied() {
            return Self::AccessDenied;
        }

        match error.code() {
            Some(UNIQUE_VIOLATION) => Self::AlreadyExists,
            Some(FOREIGN_KEY_VIOLATION) => Self::InvalidReference,
            Some(NOT_NULL_VIOLATION) => Self::MissingRequiredData("column"),
            Some(CHECK_VIOLATION) => Self::InvalidQuantity,
            _ => Self::Rest(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: &str) -> RestError {
        RestError::Status {
            status: 409,
            code: Some(code.to_string()),
            message: "constraint".to_string(),
        }
    }

    #[test]
    fn postgres_codes_map_to_variants() {
        assert!(matches!(
            CartsServiceError::from(status("23505")),
            CartsServiceError::AlreadyExists
        ));
        assert!(matches!(
            CartsServiceError::from(status("23503")),
            CartsServiceError::InvalidReference
        ));
        assert!(matches!(
            CartsServiceError::from(status("23514")),
            CartsServiceError::InvalidQuantity
        ));
        assert!(matches!(
            CartsServiceError::from(RestError::AccessDenied("rls".to_string())),
            CartsServiceError::AccessDenied
        ));
    }
}
