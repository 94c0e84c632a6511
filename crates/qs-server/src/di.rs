//! Dependency injection module using Shaku.

use qs_cache::{Cache, MemoryCache, RedisCache, RedisCacheParameters};
use qs_config::{CacheConfig, RedisConfig};
use qs_core::{QsError, QsResult};
use shaku::{module, HasComponent};
use std::sync::Arc;
use tracing::info;

// Cache backend module. Holds the Redis-backed `Cache` component.
module! {
    pub CacheModule {
        components = [
            RedisCache,
        ],
        providers = [],
    }
}

/// Builds the cache module with a Redis pool created from `redis_config`.
///
/// A disabled Redis configuration yields a module whose cache misses every
/// read and rejects every write.
pub fn build_cache_module(redis_config: &RedisConfig, cache_config: &CacheConfig) -> QsResult<Arc<CacheModule>> {
    let pool = if redis_config.enabled {
        let mut redis_cfg = deadpool_redis::Config::from_url(&redis_config.url);
        redis_cfg.pool = Some(deadpool_redis::PoolConfig::new(redis_config.pool_size as usize));
        let pool = redis_cfg
            .create_pool(Some(deadpool_redis::Runtime::Tokio1))
            .map_err(|e| QsError::Cache(format!("Failed to create Redis pool: {}", e)))?;
        Some(Arc::new(pool))
    } else {
        None
    };

    let module = CacheModule::builder()
        .with_component_parameters::<RedisCache>(RedisCacheParameters {
            pool,
            scan_page_size: cache_config.scan_page_size.max(1),
        })
        .build();

    Ok(Arc::new(module))
}

/// Resolves the cache backend for this process.
///
/// With Redis disabled the process runs on a node-local [`MemoryCache`].
pub fn build_cache_backend(redis_config: &RedisConfig, cache_config: &CacheConfig) -> QsResult<Arc<dyn Cache>> {
    if !redis_config.enabled {
        info!("Redis disabled, using in-memory cache backend");
        return Ok(Arc::new(MemoryCache::new()));
    }

    let module = build_cache_module(redis_config, cache_config)?;
    let cache: Arc<dyn Cache> = module.resolve();
    info!(url = %redis_config.url, pool_size = redis_config.pool_size, "Redis cache backend configured");
    Ok(cache)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_redis_uses_memory_backend() {
        let redis = RedisConfig {
            enabled: false,
            ..RedisConfig::default()
        };
        let cache = build_cache_backend(&redis, &CacheConfig::default()).unwrap();

        cache.set("startup:check", b"1", std::time::Duration::from_secs(5)).await.unwrap();
        assert_eq!(cache.get("startup:check").await.unwrap(), b"1".to_vec());
        assert!(cache.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_disabled_module_component_misses() {
        let redis = RedisConfig {
            enabled: false,
            ..RedisConfig::default()
        };
        let module = build_cache_module(&redis, &CacheConfig::default()).unwrap();
        let cache: Arc<dyn Cache> = module.resolve();

        assert!(cache.get("anything").await.unwrap_err().is_not_found());
        assert!(cache.ping().await.is_err());
    }

    #[test]
    fn test_pool_is_created_lazily() {
        // deadpool does not connect until the first checkout.
        let module = build_cache_module(&RedisConfig::default(), &CacheConfig::default());
        assert!(module.is_ok());
    }
}
