//! # QS Server Library
//!
//! Builds the cache layer of one process from its configuration: the backend
//! (Redis through dependency injection, or in-memory), the metrics decorator,
//! the cached repositories, warmup and the cache manager.

pub mod di;
pub mod startup;
