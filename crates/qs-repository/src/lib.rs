//! # QS Repository
//!
//! Persistence contracts of the five cached aggregates, plus in-memory
//! implementations backing tests, demos and the standalone server mode.
//!
//! ```text
//! Cached*Repository      (qs-cache decorator)
//!   ↓  Arc<dyn ScaleRepository>
//! InMemoryScaleRepository / database-backed implementation
//! ```

pub mod memory;
pub mod traits;

pub use memory::*;
pub use traits::*;
