//! Byte-oriented cache contract and its backends.

mod memory_cache;
mod redis_cache;

pub use memory_cache::MemoryCache;
pub use redis_cache::{RedisCache, RedisCacheParameters, DEFAULT_SCAN_PAGE_SIZE};

use crate::CacheResult;
use async_trait::async_trait;
use shaku::Interface;
use std::collections::HashMap;
use std::time::Duration;

/// Cache interface over a remote key-value store.
///
/// Values are opaque byte payloads. A missing key is reported as
/// [`CacheError::NotFound`](crate::CacheError::NotFound); every other error
/// means the backend could not serve the request.
#[async_trait]
pub trait Cache: Interface + Send + Sync {
    /// Get a payload.
    async fn get(&self, key: &str) -> CacheResult<Vec<u8>>;

    /// Store a payload with a TTL.
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<()>;

    /// Store a payload only if the key holds nothing. Returns true when written.
    async fn set_if_absent(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<bool>;

    /// Delete a key. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Check if a key exists.
    async fn exists(&self, key: &str) -> CacheResult<bool>;

    /// Get several payloads at once. Missing keys are absent from the map.
    async fn mget(&self, keys: &[String]) -> CacheResult<HashMap<String, Vec<u8>>>;

    /// Store several payloads sharing one TTL.
    async fn mset(&self, entries: &HashMap<String, Vec<u8>>, ttl: Duration) -> CacheResult<()>;

    /// Delete every key matching a glob pattern (`*`, `?`).
    ///
    /// Implementations walk the keyspace in bounded pages and return the
    /// number of keys removed.
    async fn delete_pattern(&self, pattern: &str) -> CacheResult<u64>;

    /// Round-trip to the backend.
    async fn ping(&self) -> CacheResult<()>;
}
