//! Cache metrics.
//!
//! [`MetricsCache`] wraps any [`Cache`] and feeds two sinks: an in-process
//! [`MetricsCollector`] whose counters back `CacheManager::get_stats`, and the
//! `metrics` facade for Prometheus export.

use crate::{Cache, CacheError, CacheResult};
use async_trait::async_trait;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Metric names of the cache layer.
pub mod names {
    /// Reads served from the cache.
    pub const CACHE_HITS_TOTAL: &str = "qs_cache_hits_total";
    /// Reads that found no entry.
    pub const CACHE_MISSES_TOTAL: &str = "qs_cache_misses_total";
    /// Operations that failed in the backend.
    pub const CACHE_ERRORS_TOTAL: &str = "qs_cache_errors_total";
    /// Every cache operation.
    pub const CACHE_OPERATIONS_TOTAL: &str = "qs_cache_operations_total";
    /// Cache operation latency in seconds.
    pub const CACHE_OPERATION_DURATION: &str = "qs_cache_operation_duration_seconds";
}

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(names::CACHE_HITS_TOTAL, "Total number of cache hits");
    describe_counter!(names::CACHE_MISSES_TOTAL, "Total number of cache misses");
    describe_counter!(
        names::CACHE_ERRORS_TOTAL,
        "Total number of failed cache operations"
    );
    describe_counter!(
        names::CACHE_OPERATIONS_TOTAL,
        "Total number of cache operations"
    );
    describe_histogram!(
        names::CACHE_OPERATION_DURATION,
        "Cache operation duration in seconds"
    );
}

/// Point-in-time view of the cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub errors: u64,
    pub operations: u64,
    /// Hits over reads.
    pub hit_rate: f64,
    /// Misses over reads.
    pub miss_rate: f64,
    /// Errors over all operations.
    pub error_rate: f64,
    /// Mean latency of all operations, in milliseconds.
    pub avg_latency_ms: f64,
}

/// Lock-free cache counters.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    hits: AtomicU64,
    misses: AtomicU64,
    errors: AtomicU64,
    operations: AtomicU64,
    total_latency_micros: AtomicU64,
}

impl MetricsCollector {
    /// Creates a collector with every counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a read that found an entry.
    pub fn record_hit(&self, operation: &'static str, latency: Duration) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        counter!(names::CACHE_HITS_TOTAL, "operation" => operation).increment(1);
        self.record_operation(operation, latency, false);
    }

    /// Records a read that found nothing.
    pub fn record_miss(&self, operation: &'static str, latency: Duration) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        counter!(names::CACHE_MISSES_TOTAL, "operation" => operation).increment(1);
        self.record_operation(operation, latency, false);
    }

    /// Records one operation, counting it as an error when `failed`.
    pub fn record_operation(&self, operation: &'static str, latency: Duration, failed: bool) {
        self.operations.fetch_add(1, Ordering::Relaxed);
        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        self.total_latency_micros.fetch_add(micros, Ordering::Relaxed);

        counter!(names::CACHE_OPERATIONS_TOTAL, "operation" => operation).increment(1);
        histogram!(names::CACHE_OPERATION_DURATION, "operation" => operation).record(latency.as_secs_f64());

        if failed {
            self.errors.fetch_add(1, Ordering::Relaxed);
            counter!(names::CACHE_ERRORS_TOTAL, "operation" => operation).increment(1);
        }
    }

    /// Computes rates from the current counters.
    #[must_use]
    pub fn snapshot(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let errors = self.errors.load(Ordering::Relaxed);
        let operations = self.operations.load(Ordering::Relaxed);
        let latency = self.total_latency_micros.load(Ordering::Relaxed);

        let ratio = |part: u64, whole: u64| {
            if whole == 0 {
                0.0
            } else {
                part as f64 / whole as f64
            }
        };
        let reads = hits + misses;

        CacheStats {
            hits,
            misses,
            errors,
            operations,
            hit_rate: ratio(hits, reads),
            miss_rate: ratio(misses, reads),
            error_rate: ratio(errors, operations),
            avg_latency_ms: ratio(latency, operations) / 1000.0,
        }
    }

    /// Zeroes every counter. The wrapped cache is untouched.
    pub fn reset(&self) {
        for counter in [
            &self.hits,
            &self.misses,
            &self.errors,
            &self.operations,
            &self.total_latency_micros,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// Cache decorator recording hits, misses, errors and latency.
pub struct MetricsCache {
    inner: Arc<dyn Cache>,
    collector: Arc<MetricsCollector>,
}

impl MetricsCache {
    /// Wraps `inner`, reporting into `collector`.
    #[must_use]
    pub fn new(inner: Arc<dyn Cache>, collector: Arc<MetricsCollector>) -> Self {
        Self { inner, collector }
    }

    /// Returns the collector fed by this decorator.
    #[must_use]
    pub fn collector(&self) -> &Arc<MetricsCollector> {
        &self.collector
    }

    fn observe<T>(&self, operation: &'static str, started: Instant, result: &CacheResult<T>) {
        self.collector
            .record_operation(operation, started.elapsed(), result.is_err());
    }
}

impl std::fmt::Debug for MetricsCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsCache")
            .field("stats", &self.collector.snapshot())
            .finish()
    }
}

#[async_trait]
impl Cache for MetricsCache {
    async fn get(&self, key: &str) -> CacheResult<Vec<u8>> {
        let started = Instant::now();
        let result = self.inner.get(key).await;
        let latency = started.elapsed();
        match &result {
            Ok(_) => self.collector.record_hit("get", latency),
            Err(CacheError::NotFound) => self.collector.record_miss("get", latency),
            Err(_) => self.collector.record_operation("get", latency, true),
        }
        result
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<()> {
        let started = Instant::now();
        let result = self.inner.set(key, value, ttl).await;
        self.observe("set", started, &result);
        result
    }

    async fn set_if_absent(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<bool> {
        let started = Instant::now();
        let result = self.inner.set_if_absent(key, value, ttl).await;
        self.observe("set_if_absent", started, &result);
        result
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let started = Instant::now();
        let result = self.inner.delete(key).await;
        self.observe("delete", started, &result);
        result
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        let started = Instant::now();
        let result = self.inner.exists(key).await;
        self.observe("exists", started, &result);
        result
    }

    async fn mget(&self, keys: &[String]) -> CacheResult<HashMap<String, Vec<u8>>> {
        let started = Instant::now();
        let result = self.inner.mget(keys).await;
        self.observe("mget", started, &result);
        result
    }

    async fn mset(&self, entries: &HashMap<String, Vec<u8>>, ttl: Duration) -> CacheResult<()> {
        let started = Instant::now();
        let result = self.inner.mset(entries, ttl).await;
        self.observe("mset", started, &result);
        result
    }

    async fn delete_pattern(&self, pattern: &str) -> CacheResult<u64> {
        let started = Instant::now();
        let result = self.inner.delete_pattern(pattern).await;
        self.observe("delete_pattern", started, &result);
        result
    }

    async fn ping(&self) -> CacheResult<()> {
        let started = Instant::now();
        let result = self.inner.ping().await;
        self.observe("ping", started, &result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryCache;

    fn wrapped() -> (Arc<MemoryCache>, MetricsCache) {
        let memory = Arc::new(MemoryCache::new());
        let cache = MetricsCache::new(memory.clone(), Arc::new(MetricsCollector::new()));
        (memory, cache)
    }

    #[tokio::test]
    async fn test_hit_miss_error_accounting() {
        let (memory, cache) = wrapped();
        cache.set("k", b"v", Duration::from_secs(60)).await.unwrap();
        cache.get("k").await.unwrap();
        cache.get("k").await.unwrap();
        cache.get("missing").await.unwrap_err();

        memory.set_unavailable(true);
        cache.get("k").await.unwrap_err();

        let stats = cache.collector().snapshot();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.operations, 5);
        assert!((stats.hit_rate - 2.0 / 3.0).abs() < 1e-9);
        assert!((stats.miss_rate - 1.0 / 3.0).abs() < 1e-9);
        assert!((stats.error_rate - 0.2).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_write_errors_are_counted() {
        let (memory, cache) = wrapped();
        memory.set_unavailable(true);
        cache.set("k", b"v", Duration::from_secs(60)).await.unwrap_err();
        cache.delete_pattern("k*").await.unwrap_err();

        let stats = cache.collector().snapshot();
        assert_eq!(stats.errors, 2);
        assert_eq!(stats.hits + stats.misses, 0);
    }

    #[tokio::test]
    async fn test_reset_keeps_cache_contents() {
        let (memory, cache) = wrapped();
        cache.set("k", b"v", Duration::from_secs(60)).await.unwrap();
        cache.collector().reset();

        assert_eq!(cache.collector().snapshot(), CacheStats::default());
        assert_eq!(memory.get("k").await.unwrap(), b"v".to_vec());
    }

    #[test]
    fn test_empty_snapshot_has_zero_rates() {
        let stats = MetricsCollector::new().snapshot();
        assert_eq!(stats.hit_rate, 0.0);
        assert_eq!(stats.avg_latency_ms, 0.0);
    }
}
