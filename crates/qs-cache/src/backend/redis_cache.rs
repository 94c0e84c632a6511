//! Redis-based cache implementation.

use super::Cache;
use crate::{CacheError, CacheResult};
use async_trait::async_trait;
use deadpool_redis::redis::{cmd, pipe, AsyncCommands};
use deadpool_redis::{Connection, Pool};
use shaku::Component;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Default COUNT hint of each SCAN page.
pub const DEFAULT_SCAN_PAGE_SIZE: u32 = 100;

/// Redis-based cache.
#[derive(Component)]
#[shaku(interface = Cache)]
pub struct RedisCache {
    /// Redis connection pool. `None` when Redis is disabled.
    pool: Option<Arc<Pool>>,
    /// COUNT hint of each SCAN page during pattern deletes.
    #[shaku(default = DEFAULT_SCAN_PAGE_SIZE)]
    scan_page_size: u32,
}

impl RedisCache {
    /// Create a new Redis cache.
    #[must_use]
    pub fn new(pool: Arc<Pool>) -> Self {
        Self::with_scan_page_size(pool, DEFAULT_SCAN_PAGE_SIZE)
    }

    /// Create a cache with a custom SCAN page size.
    #[must_use]
    pub fn with_scan_page_size(pool: Arc<Pool>, scan_page_size: u32) -> Self {
        Self {
            pool: Some(pool),
            scan_page_size: scan_page_size.max(1),
        }
    }

    /// Create a disabled cache: every read misses and writes are dropped.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            pool: None,
            scan_page_size: DEFAULT_SCAN_PAGE_SIZE,
        }
    }

    /// Check if a pool is configured.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.pool.is_some()
    }

    async fn get_conn(&self) -> CacheResult<Connection> {
        match &self.pool {
            Some(pool) => Ok(pool.get().await?),
            None => Err(CacheError::backend("cache is disabled")),
        }
    }
}

fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Vec<u8>> {
        if !self.is_enabled() {
            return Err(CacheError::NotFound);
        }

        let mut conn = self.get_conn().await?;
        let value: Option<Vec<u8>> = conn.get(key).await?;

        match value {
            Some(bytes) => {
                debug!("Cache hit for key '{}'", key);
                Ok(bytes)
            }
            None => {
                debug!("Cache miss for key '{}'", key);
                Err(CacheError::NotFound)
            }
        }
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        let mut conn = self.get_conn().await?;
        let secs = ttl_secs(ttl);
        conn.set_ex::<_, _, ()>(key, value, secs).await?;

        debug!("Cached key '{}' with TTL {}s", key, secs);
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<bool> {
        if !self.is_enabled() {
            return Ok(false);
        }

        let mut conn = self.get_conn().await?;
        let secs = ttl_secs(ttl);
        let reply: Option<String> = cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(secs)
            .query_async(&mut conn)
            .await?;

        let written = reply.is_some();
        debug!("Conditional set of key '{}' with TTL {}s: {}", key, secs, written);
        Ok(written)
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        let mut conn = self.get_conn().await?;
        let deleted: i64 = conn.del(key).await?;

        debug!("Deleted key '{}': {}", key, deleted > 0);
        Ok(())
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        if !self.is_enabled() {
            return Ok(false);
        }

        let mut conn = self.get_conn().await?;
        let exists: bool = conn.exists(key).await?;
        Ok(exists)
    }

    async fn mget(&self, keys: &[String]) -> CacheResult<HashMap<String, Vec<u8>>> {
        if !self.is_enabled() || keys.is_empty() {
            return Ok(HashMap::new());
        }

        let mut conn = self.get_conn().await?;
        let values: Vec<Option<Vec<u8>>> = cmd("MGET").arg(keys).query_async(&mut conn).await?;

        Ok(keys
            .iter()
            .zip(values)
            .filter_map(|(key, value)| value.map(|bytes| (key.clone(), bytes)))
            .collect())
    }

    async fn mset(&self, entries: &HashMap<String, Vec<u8>>, ttl: Duration) -> CacheResult<()> {
        if !self.is_enabled() || entries.is_empty() {
            return Ok(());
        }

        let mut conn = self.get_conn().await?;
        let secs = ttl_secs(ttl);
        let mut batch = pipe();
        for (key, value) in entries {
            batch.set_ex(key, value.as_slice(), secs).ignore();
        }
        let _: () = batch.query_async(&mut conn).await?;

        debug!("Cached {} keys with TTL {}s", entries.len(), secs);
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> CacheResult<u64> {
        if !self.is_enabled() {
            return Ok(0);
        }

        let mut conn = self.get_conn().await?;
        let mut cursor: u64 = 0;
        let mut total: u64 = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(self.scan_page_size)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                let deleted: u64 = conn.del(&keys).await?;
                total += deleted;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        debug!("Deleted {} keys matching pattern '{}'", total, pattern);
        Ok(total)
    }

    async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.get_conn().await?;
        let _: String = cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_floor_is_one_second() {
        assert_eq!(ttl_secs(Duration::from_millis(10)), 1);
        assert_eq!(ttl_secs(Duration::from_secs(90)), 90);
    }

    #[tokio::test]
    async fn test_disabled_cache() {
        let cache = RedisCache::disabled();
        assert!(!cache.is_enabled());
        assert_eq!(cache.get("scale:phq9").await, Err(CacheError::NotFound));
        assert!(cache.set("scale:phq9", b"{}", Duration::from_secs(5)).await.is_ok());
        assert!(!cache.set_if_absent("scale:phq9", b"{}", Duration::from_secs(5)).await.unwrap());
        assert!(!cache.exists("scale:phq9").await.unwrap());
        assert_eq!(cache.delete_pattern("scale:*").await.unwrap(), 0);
        assert!(matches!(cache.ping().await, Err(CacheError::BackendUnavailable(_))));
    }
}
