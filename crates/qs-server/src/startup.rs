//! Server startup utilities.

use crate::di::build_cache_backend;
use qs_cache::{
    register_metrics, Cache, CacheContext, CacheManager, CacheSettings, CachedAssessmentRepository,
    CachedPlanRepository, CachedQuestionnaireRepository, CachedScaleRepository, CachedTesteeRepository,
    MetricsCache, MetricsCollector, WarmupService, WarmupSummary, WarmupTargets,
};
use qs_config::{AppConfig, ObservabilityConfig};
use qs_core::{HealthCheck, HealthStatus, QsError, QsResult};
use qs_repository::{
    InMemoryAssessmentRepository, InMemoryPlanRepository, InMemoryQuestionnaireRepository, InMemoryScaleRepository,
    InMemoryTesteeRepository,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

/// Cached repositories and the cache manager of one process.
pub struct CacheLayer {
    pub manager: Arc<CacheManager>,
    pub scales: Arc<CachedScaleRepository>,
    pub questionnaires: Arc<CachedQuestionnaireRepository>,
    pub assessments: Arc<CachedAssessmentRepository>,
    pub testees: Arc<CachedTesteeRepository>,
    pub plans: Arc<CachedPlanRepository>,
    warmup: WarmupTargets,
    warmup_enabled: bool,
}

impl CacheLayer {
    /// Wires the cache layer over the in-memory repositories.
    pub fn build(config: &AppConfig) -> QsResult<Self> {
        let backend = build_cache_backend(&config.redis, &config.cache)?;
        let collector = Arc::new(MetricsCollector::new());
        let cache: Arc<dyn Cache> = Arc::new(MetricsCache::new(backend, Arc::clone(&collector)));
        let context = CacheContext::new(cache, CacheSettings::from(&config.cache));

        let scales = Arc::new(CachedScaleRepository::new(
            Arc::new(InMemoryScaleRepository::new()),
            &context,
        ));
        let questionnaires = Arc::new(CachedQuestionnaireRepository::new(
            Arc::new(InMemoryQuestionnaireRepository::new()),
            &context,
        ));
        let assessments = Arc::new(CachedAssessmentRepository::new(
            Arc::new(InMemoryAssessmentRepository::new()),
            &context,
        ));
        let testees = Arc::new(CachedTesteeRepository::new(
            Arc::new(InMemoryTesteeRepository::new()),
            &context,
        ));
        let plans = Arc::new(CachedPlanRepository::new(Arc::new(InMemoryPlanRepository::new()), &context));

        let warmup = WarmupService::new()
            .with_scales(Arc::clone(&scales))
            .with_questionnaires(Arc::clone(&questionnaires))
            .with_assessments(Arc::clone(&assessments))
            .with_testees(Arc::clone(&testees))
            .with_plans(Arc::clone(&plans));
        let manager = Arc::new(CacheManager::new(context, collector).with_warmup(Arc::new(warmup)));

        Ok(Self {
            manager,
            scales,
            questionnaires,
            assessments,
            testees,
            plans,
            warmup: WarmupTargets::from(&config.cache.warmup),
            warmup_enabled: config.cache.warmup.enabled,
        })
    }

    /// Runs the configured warmup, if enabled.
    pub async fn warm(&self) -> Option<WarmupSummary> {
        if !self.warmup_enabled {
            return None;
        }
        let summary = self.manager.warmup(&self.warmup).await;
        info!(
            loaded = summary.loaded(),
            failed = summary.failed(),
            elapsed_ms = summary.elapsed_ms,
            "Cache warmup finished"
        );
        Some(summary)
    }

    /// Checks the backend once and logs the result.
    pub async fn report_health(&self) -> HealthStatus {
        let status = self.manager.check().await;
        match &status {
            HealthStatus::Healthy => info!(component = self.manager.name(), "Cache backend healthy"),
            HealthStatus::Degraded(reason) | HealthStatus::Unhealthy(reason) => {
                warn!(component = self.manager.name(), reason = %reason, "Cache backend not healthy, serving from repositories");
            }
        }
        status
    }

    /// Waits for outstanding background cache writes.
    pub async fn shutdown(&self) {
        self.manager.flush().await;
        let stats = self.manager.get_stats();
        info!(
            hits = stats.hits,
            misses = stats.misses,
            errors = stats.errors,
            hit_rate = stats.hit_rate,
            "Cache layer drained"
        );
    }
}

/// Installs the Prometheus exporter and describes the cache metrics.
pub fn init_metrics(config: &ObservabilityConfig) -> QsResult<()> {
    if !config.metrics_enabled {
        return Ok(());
    }

    let addr: SocketAddr = config
        .metrics_addr
        .parse()
        .map_err(|e| QsError::Configuration(format!("Invalid metrics address: {}", e)))?;
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| QsError::Internal(format!("Failed to install Prometheus exporter: {}", e)))?;
    register_metrics();

    info!("Prometheus exporter listening on {}", addr);
    Ok(())
}

/// Prints cache configuration at startup.
pub fn print_startup_info(config: &AppConfig) {
    let separator = "=".repeat(60);
    info!("{}", separator);
    info!("Environment: {}", config.app.environment);
    info!("Redis:       {}", if config.redis.enabled { config.redis.url.as_str() } else { "disabled" });
    info!(
        "Namespace:   {}",
        if config.cache.namespace.is_empty() { "(none)" } else { config.cache.namespace.as_str() }
    );
    info!("Compression: {}", config.cache.compress_payload);
    info!("Warmup:      {}", config.cache.warmup.enabled);
    info!("{}", separator);
}
