//! # rakoon_core
//!
//! Credential and token core for the Rakoon user service.

pub mod auth;
pub mod config;
pub mod migrate;
pub mod models;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
