//! Recognition
//!
//! Turns a photo into at most one catalog product: annotate the image, order
//! the returned labels by priority, drop the ones that are not food, and match
//! the rest against the catalog until one resolves.

mod candidates;
mod errors;
mod models;
mod service;

pub use candidates::*;
pub use errors::RecognitionError;
pub use models::*;
pub use service::*;
