//! Domain aggregates cached by the framework.
//!
//! Business rules live elsewhere; these types only carry the state that is
//! persisted and cached.

pub mod assessment;
pub mod plan;
pub mod questionnaire;
pub mod scale;
pub mod testee;

pub use assessment::*;
pub use plan::*;
pub use questionnaire::*;
pub use scale::*;
pub use testee::*;
