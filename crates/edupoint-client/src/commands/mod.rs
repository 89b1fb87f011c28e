//! CLI command implementations.

pub mod auth;
pub mod config;
pub mod status;
