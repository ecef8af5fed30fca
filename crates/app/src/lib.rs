//! Scancart application layer: backend access, sessions, catalog, vision
//! recognition and the cart.

pub mod auth;
pub mod config;
pub mod context;
pub mod domain;
pub mod observability;
pub mod recognition;
pub mod rest;
pub mod retry;
pub mod storage;
pub mod vision;

#[cfg(test)]
mod test;
