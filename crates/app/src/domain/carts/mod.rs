//! Carts

pub mod backend;
pub mod errors;
pub mod models;
pub mod service;
mod store;
pub mod sync;

pub use backend::{CartsBackend, MemoryCartsBackend, MockCartsBackend, RestCartsBackend};
pub use errors::CartsServiceError;
pub use service::*;
pub use store::{LocalCartStore, StoredCart};
