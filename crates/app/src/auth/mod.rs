//! Authentication

mod errors;
mod identity;
mod models;
mod service;
mod session;
mod token;

pub use errors::*;
pub use identity::*;
pub use models::*;
pub use service::*;
pub use session::{SECURE_VALUE_LIMIT, SESSION_KEY, SessionStorage};
pub use token::*;
