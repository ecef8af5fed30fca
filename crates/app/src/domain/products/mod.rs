//! Products

mod cache;
pub mod errors;
mod repository;
pub mod service;

pub use cache::{DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL, ProductCache};
pub use errors::ProductsServiceError;
pub use repository::*;
pub use scancart::products::{Product, ProductUuid};
pub use service::*;
