//! # QS Config
//!
//! Configuration management for the QS platform.
//! Supports layered configuration from files and environment variables,
//! validated once at startup.

mod app_config;
mod loader;
mod validation;

pub use app_config::*;
pub use loader::*;
pub use validation::*;
