//! Scancart
//!
//! Grocery label classification and catalog matching. Given a free-text label
//! from an image-recognition service, decide whether it names food and find
//! the single catalog product it most plausibly refers to.

pub mod classifier;
pub mod fixtures;
pub mod matcher;
pub mod prelude;
pub mod products;
pub mod uuids;
