//! Cloud vision API

mod client;
mod errors;
mod models;
mod sample;

pub use client::*;
pub use errors::VisionError;
pub use models::*;
pub use sample::{SampleVisionClient, sample_response};
