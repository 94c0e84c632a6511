//! # QS Cache
//!
//! Caching framework of the QS platform: a byte-oriented [`Cache`] over
//! Redis, typed and metered views of it, key construction, TTL jitter,
//! singleflight, and cached decorators for every repository of `qs-repository`.
//!
//! The cache layer fails open. Decorators return only errors produced by the
//! repository they wrap; a cache outage degrades to uncached operation.
//!
//! ```rust,ignore
//! let settings = CacheSettings::from(&config.cache);
//! let collector = Arc::new(MetricsCollector::new());
//! let cache = Arc::new(MetricsCache::new(backend, Arc::clone(&collector)));
//! let context = CacheContext::new(cache, settings);
//!
//! let scales = CachedScaleRepository::new(scale_repository, &context);
//! let phq9 = scales.find_by_code("PHQ9").await?;
//! ```

pub mod backend;
mod background;
mod codec;
mod context;
mod entity;
mod error;
mod jitter;
mod keys;
mod manager;
pub mod metrics;
pub mod repository;
mod settings;
mod singleflight;
mod typed;
mod warmup;

pub use backend::{Cache, MemoryCache, RedisCache, RedisCacheParameters};
pub use background::BackgroundWriter;
pub use codec::PayloadCodec;
pub use context::CacheContext;
pub use entity::{EntityCache, WarmOutcome};
pub use error::{CacheError, CacheResult};
pub use jitter::TtlJitter;
pub use keys::{CacheKeyBuilder, SCALE_LIST_KEY};
pub use manager::CacheManager;
pub use metrics::{register_metrics, CacheStats, MetricsCache, MetricsCollector};
pub use repository::{
    CachedAssessmentRepository, CachedPlanRepository, CachedQuestionnaireRepository, CachedScaleRepository,
    CachedTesteeRepository,
};
pub use settings::CacheSettings;
pub use singleflight::SingleFlight;
pub use typed::{Lookup, TypedCache};
pub use warmup::{WarmupReport, WarmupService, WarmupSummary, WarmupTargets};
