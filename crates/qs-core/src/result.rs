//! Result type aliases for the QS platform.

use crate::QsError;

/// A specialized `Result` type for QS operations.
pub type QsResult<T> = Result<T, QsError>;
