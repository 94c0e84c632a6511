//! Operational facade over the cache.

use crate::{CacheContext, CacheResult, CacheStats, MetricsCollector, WarmupService, WarmupSummary, WarmupTargets};
use async_trait::async_trait;
use qs_core::{HealthCheck, HealthStatus};
use std::sync::Arc;
use tracing::{info, warn};

/// Stats, pattern clearing, warmup and health checks.
pub struct CacheManager {
    context: CacheContext,
    collector: Arc<MetricsCollector>,
    warmup: Option<Arc<WarmupService>>,
}

impl CacheManager {
    /// `collector` should be the one fed by the `MetricsCache` in `context`.
    #[must_use]
    pub fn new(context: CacheContext, collector: Arc<MetricsCollector>) -> Self {
        Self {
            context,
            collector,
            warmup: None,
        }
    }

    /// Attaches the warmup service run by [`warmup`](Self::warmup).
    #[must_use]
    pub fn with_warmup(mut self, service: Arc<WarmupService>) -> Self {
        self.warmup = Some(service);
        self
    }

    /// Current hit, miss and error counters.
    #[must_use]
    pub fn get_stats(&self) -> CacheStats {
        self.collector.snapshot()
    }

    /// Zeroes the counters. Cached entries are kept.
    pub fn reset_stats(&self) {
        self.collector.reset();
    }

    /// Deletes every key matching `pattern` within the configured namespace.
    pub async fn clear_pattern(&self, pattern: &str) -> CacheResult<u64> {
        let pattern = self.context.keys().apply(pattern);
        let deleted = self.context.cache().delete_pattern(&pattern).await?;
        info!(pattern = %pattern, deleted, "Cleared cache keys");
        Ok(deleted)
    }

    /// Runs warmup for `targets`. Without a registered service nothing is loaded.
    pub async fn warmup(&self, targets: &WarmupTargets) -> WarmupSummary {
        match &self.warmup {
            Some(service) => service.warmup(targets).await,
            None => {
                warn!("Cache warmup requested but no warmup service is registered");
                WarmupSummary::default()
            }
        }
    }

    /// Round-trips to the cache backend.
    pub async fn health_check(&self) -> CacheResult<()> {
        self.context.cache().ping().await
    }

    /// Waits for outstanding background cache writes.
    pub async fn flush(&self) {
        self.context.writer().wait_idle().await;
    }
}

#[async_trait]
impl HealthCheck for CacheManager {
    fn name(&self) -> &str {
        "cache"
    }

    async fn check(&self) -> HealthStatus {
        match self.health_check().await {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        }
    }
}

impl std::fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager")
            .field("context", &self.context)
            .field("stats", &self.collector.snapshot())
            .finish()
    }
}
