mod common;

use common::{published_scale, CountingScaleRepository, CountingTesteeRepository};
use qs_cache::{
    Cache, CacheContext, CacheManager, CacheSettings, CacheStats, CachedScaleRepository, CachedTesteeRepository, MemoryCache,
    MetricsCache, MetricsCollector, WarmupService, WarmupTargets,
};
use qs_core::domain::{Gender, Testee};
use qs_core::{HealthCheck, OrgId, TesteeId};
use qs_repository::{ScaleRepository, TesteeRepository};
use std::sync::Arc;
use std::time::Duration;

struct Fixture {
    memory: Arc<MemoryCache>,
    collector: Arc<MetricsCollector>,
    context: CacheContext,
    scales: Arc<CountingScaleRepository>,
    testees: Arc<CountingTesteeRepository>,
    cached_scales: Arc<CachedScaleRepository>,
    cached_testees: Arc<CachedTesteeRepository>,
}

async fn fixture(settings: CacheSettings) -> Fixture {
    let memory = Arc::new(MemoryCache::new());
    let collector = Arc::new(MetricsCollector::new());
    let cache: Arc<dyn Cache> = Arc::new(MetricsCache::new(memory.clone(), collector.clone()));
    let context = CacheContext::new(cache, settings);

    let scales = Arc::new(CountingScaleRepository::with_scales(vec![
        published_scale("PHQ9"),
        published_scale("GAD7"),
    ]));
    let testees = Arc::new(CountingTesteeRepository::default());
    testees
        .inner
        .save(&Testee::new(OrgId::new(1), "Alice", Gender::Female))
        .await
        .unwrap();

    Fixture {
        cached_scales: Arc::new(CachedScaleRepository::new(scales.clone(), &context)),
        cached_testees: Arc::new(CachedTesteeRepository::new(testees.clone(), &context)),
        memory,
        collector,
        context,
        scales,
        testees,
    }
}

fn manager(f: &Fixture) -> CacheManager {
    let service = WarmupService::new()
        .with_scales(f.cached_scales.clone())
        .with_testees(f.cached_testees.clone());
    CacheManager::new(f.context.clone(), f.collector.clone()).with_warmup(Arc::new(service))
}

fn targets() -> WarmupTargets {
    WarmupTargets {
        scale_codes: vec!["PHQ9".to_string(), "NOPE".to_string()],
        testee_ids: vec![1],
        published_scale_list: true,
        ..WarmupTargets::default()
    }
}

#[tokio::test]
async fn test_warmup_loads_hot_keys() {
    let f = fixture(CacheSettings::default()).await;
    let manager = manager(&f);

    let summary = manager.warmup(&targets()).await;

    let scale = summary.report("scale").unwrap();
    assert_eq!((scale.loaded, scale.missing, scale.failed), (1, 1, 0));
    assert_eq!(summary.report("scale_list").unwrap().loaded, 1);
    assert_eq!(summary.report("testee").unwrap().loaded, 1);
    assert_eq!(summary.loaded(), 3);
    assert_eq!(summary.failed(), 0);

    assert_eq!(
        f.memory.keys(),
        vec!["scale:list:v1".to_string(), "scale:phq9".to_string(), "testee:info:1".to_string()]
    );

    f.cached_scales.find_by_code("PHQ9").await.unwrap();
    f.cached_testees.find_by_id(TesteeId::new(1)).await.unwrap();
    assert_eq!(f.scales.calls.count("find_by_code"), 2);
    assert_eq!(f.testees.calls.count("find_by_id"), 1);
}

#[tokio::test]
async fn test_second_warmup_skips_cached_keys() {
    let f = fixture(CacheSettings::default()).await;
    let manager = manager(&f);

    manager.warmup(&targets()).await;
    let summary = manager.warmup(&targets()).await;

    assert_eq!(summary.report("scale").unwrap().skipped, 1);
    assert_eq!(summary.report("testee").unwrap().skipped, 1);
}

#[tokio::test]
async fn test_warmup_failures_are_counted_not_raised() {
    let f = fixture(CacheSettings::default()).await;
    let manager = manager(&f);
    f.memory.set_unavailable(true);

    let summary = manager.warmup(&targets()).await;

    assert_eq!(summary.report("scale").unwrap().failed, 1);
    assert_eq!(summary.report("scale_list").unwrap().failed, 1);
    assert_eq!(summary.report("testee").unwrap().failed, 1);
}

#[tokio::test]
async fn test_warmup_without_service_is_empty() {
    let f = fixture(CacheSettings::default()).await;
    let manager = CacheManager::new(f.context.clone(), f.collector.clone());

    let summary = manager.warmup(&targets()).await;
    assert!(summary.reports.is_empty());
    assert!(f.memory.is_empty());
}

#[tokio::test]
async fn test_stats_track_decorator_traffic() {
    let f = fixture(CacheSettings::default()).await;
    let manager = manager(&f);

    f.cached_scales.find_by_code("PHQ9").await.unwrap();
    manager.flush().await;
    f.cached_scales.find_by_code("PHQ9").await.unwrap();

    let stats = manager.get_stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.errors, 0);
    assert!((stats.hit_rate - 0.5).abs() < f64::EPSILON);

    manager.reset_stats();
    assert_eq!(manager.get_stats(), CacheStats::default());
}

#[tokio::test]
async fn test_clear_pattern_stays_in_namespace() {
    let f = fixture(CacheSettings::default().with_namespace("dev")).await;
    let manager = manager(&f);
    f.memory
        .set("prod:scale:phq9", b"{}", Duration::from_secs(60))
        .await
        .unwrap();

    f.cached_scales.find_by_code("PHQ9").await.unwrap();
    f.cached_scales.find_by_code("GAD7").await.unwrap();
    manager.flush().await;

    assert_eq!(manager.clear_pattern("scale:*").await.unwrap(), 2);
    assert_eq!(f.memory.keys(), vec!["prod:scale:phq9".to_string()]);
}

#[tokio::test]
async fn test_health_check_follows_backend() {
    let f = fixture(CacheSettings::default()).await;
    let manager = manager(&f);

    assert!(manager.health_check().await.is_ok());
    assert_eq!(manager.name(), "cache");
    assert!(manager.check().await.is_healthy());

    f.memory.set_unavailable(true);
    assert!(manager.health_check().await.is_err());
    assert!(manager.check().await.is_unhealthy());
}
