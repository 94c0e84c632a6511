//! Error taxonomy of the cache layer.
//!
//! A miss is reported as [`CacheError::NotFound`] so callers can tell it apart
//! from a failing backend. Decorators translate every other variant into a
//! warning and carry on without the cache.

use qs_core::QsError;
use thiserror::Error;

/// Cache layer error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The key does not exist or has expired.
    #[error("cache key not found")]
    NotFound,

    /// The cache store is unreachable or returned an error.
    #[error("cache backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Payload could not be encoded or decoded.
    #[error("cache serialization error: {0}")]
    Serialization(String),
}

impl CacheError {
    /// Returns true for a plain miss.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// Creates a backend error.
    #[must_use]
    pub fn backend<T: Into<String>>(message: T) -> Self {
        Self::BackendUnavailable(message.into())
    }
}

/// Result type of cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

impl From<deadpool_redis::PoolError> for CacheError {
    fn from(err: deadpool_redis::PoolError) -> Self {
        Self::BackendUnavailable(format!("failed to get Redis connection: {err}"))
    }
}

impl From<deadpool_redis::redis::RedisError> for CacheError {
    fn from(err: deadpool_redis::redis::RedisError) -> Self {
        Self::BackendUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        Self::Serialization(format!("payload compression failed: {err}"))
    }
}

impl From<CacheError> for QsError {
    fn from(err: CacheError) -> Self {
        Self::Cache(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_distinct() {
        assert!(CacheError::NotFound.is_not_found());
        assert!(!CacheError::backend("connection refused").is_not_found());
    }

    #[test]
    fn test_into_qs_error() {
        let err: QsError = CacheError::backend("down").into();
        assert_eq!(err.error_code(), "CACHE_ERROR");
        assert!(err.is_retriable());
    }

    #[test]
    fn test_json_error_is_serialization() {
        let err = serde_json::from_slice::<u32>(b"{").unwrap_err();
        assert!(matches!(CacheError::from(err), CacheError::Serialization(_)));
    }
}
