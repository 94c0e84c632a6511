//! # QS Core
//!
//! Core types, traits, and error definitions for the QS questionnaire and
//! medical-scale platform. Every other crate in the workspace builds on the
//! error type, typed ids, pagination and domain aggregates defined here.

pub mod conditions;
pub mod domain;
pub mod error;
pub mod id;
pub mod pagination;
pub mod result;
pub mod telemetry;
pub mod traits;

pub use conditions::*;
pub use error::*;
pub use id::*;
pub use pagination::*;
pub use result::*;
pub use traits::*;

// Re-export shaku for dependency injection
pub use shaku::Interface;
