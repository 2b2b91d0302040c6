//! # molar_core
//!
//! Core domain logic for Molar: staff identities, credentials, and patient records.

pub mod auth;
pub mod migrate;
pub mod models;
pub mod seed;
pub mod store;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
