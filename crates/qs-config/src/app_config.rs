//! Application configuration structures.

use qs_core::telemetry::{LogFormat, LoggingOptions};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application name and metadata.
    #[serde(default)]
    pub app: AppMetadata,

    /// Redis configuration.
    #[serde(default)]
    pub redis: RedisConfig,

    /// Cache framework configuration.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Application metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppMetadata {
    /// Application name.
    pub name: String,
    /// Application version.
    pub version: String,
    /// Environment (development, staging, production).
    pub environment: String,
}

impl Default for AppMetadata {
    fn default() -> Self {
        Self {
            name: "qs-server".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Redis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    /// Redis URL.
    pub url: String,
    /// Connection pool size.
    pub pool_size: u32,
    /// Enable Redis. When disabled the process runs on an in-memory cache.
    pub enabled: bool,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            pool_size: 10,
            enabled: true,
        }
    }
}

/// How an entity's cache entry reacts to a successful write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheMode {
    /// Delete the entry; the next read reloads it.
    #[default]
    CacheAside,
    /// Overwrite the entry with the freshly written value.
    WriteThrough,
}

/// Per-entity cache policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityPolicy {
    /// Base TTL before jitter, in seconds.
    pub ttl_secs: u64,
    /// Reaction to writes.
    #[serde(default)]
    pub mode: CacheMode,
    /// Collapse concurrent misses for the same key into one load.
    #[serde(default)]
    pub singleflight: bool,
}

impl EntityPolicy {
    /// Cache-aside policy.
    #[must_use]
    pub const fn cache_aside(ttl_secs: u64, singleflight: bool) -> Self {
        Self {
            ttl_secs,
            mode: CacheMode::CacheAside,
            singleflight,
        }
    }

    /// Write-through policy.
    #[must_use]
    pub const fn write_through(ttl_secs: u64) -> Self {
        Self {
            ttl_secs,
            mode: CacheMode::WriteThrough,
            singleflight: false,
        }
    }

    /// Returns the base TTL as a Duration.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

const HOUR: u64 = 60 * 60;

/// Cache policies of every cached entity and query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityPolicies {
    pub scale: EntityPolicy,
    pub questionnaire: EntityPolicy,
    pub assessment_detail: EntityPolicy,
    pub assessment_status: EntityPolicy,
    pub testee: EntityPolicy,
    pub plan: EntityPolicy,
    pub assessment_list: EntityPolicy,
    pub scale_list: EntityPolicy,
}

impl Default for EntityPolicies {
    fn default() -> Self {
        Self {
            scale: EntityPolicy::cache_aside(24 * HOUR, true),
            questionnaire: EntityPolicy::cache_aside(12 * HOUR, true),
            assessment_detail: EntityPolicy::cache_aside(2 * HOUR, false),
            assessment_status: EntityPolicy::write_through(30 * 60),
            testee: EntityPolicy::cache_aside(2 * HOUR, false),
            plan: EntityPolicy::cache_aside(2 * HOUR, false),
            assessment_list: EntityPolicy::cache_aside(5 * 60, false),
            scale_list: EntityPolicy::cache_aside(10 * 60, false),
        }
    }
}

impl EntityPolicies {
    /// Returns every policy paired with its name.
    #[must_use]
    pub fn named(&self) -> [(&'static str, &EntityPolicy); 8] {
        [
            ("scale", &self.scale),
            ("questionnaire", &self.questionnaire),
            ("assessment_detail", &self.assessment_detail),
            ("assessment_status", &self.assessment_status),
            ("testee", &self.testee),
            ("plan", &self.plan),
            ("assessment_list", &self.assessment_list),
            ("scale_list", &self.scale_list),
        ]
    }
}

/// Hot keys loaded at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WarmupConfig {
    /// Run warmup at startup.
    pub enabled: bool,
    pub scale_codes: Vec<String>,
    pub questionnaire_codes: Vec<String>,
    pub testee_ids: Vec<u64>,
    pub plan_ids: Vec<u64>,
    pub assessment_ids: Vec<u64>,
    /// Rebuild the published scale list.
    pub published_scale_list: bool,
}

/// Cache framework configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Key prefix shared by every cache key. Empty means unprefixed.
    pub namespace: String,
    /// Ratio of random TTL spread, in [0, 1].
    pub ttl_jitter_ratio: f64,
    /// Gzip payloads on write.
    pub compress_payload: bool,
    /// TTL of "confirmed absent" markers, in seconds.
    pub negative_ttl_secs: u64,
    /// COUNT hint of each SCAN page during pattern deletes.
    pub scan_page_size: u32,
    /// Maximum outstanding background cache writes.
    pub background_writers: usize,
    pub entities: EntityPolicies,
    pub warmup: WarmupConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            namespace: String::new(),
            ttl_jitter_ratio: 0.1,
            compress_payload: false,
            negative_ttl_secs: 5 * 60,
            scan_page_size: 100,
            background_writers: 256,
            entities: EntityPolicies::default(),
            warmup: WarmupConfig::default(),
        }
    }
}

impl CacheConfig {
    /// Returns the negative-cache TTL as a Duration.
    #[must_use]
    pub const fn negative_ttl(&self) -> Duration {
        Duration::from_secs(self.negative_ttl_secs)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Log format (json, pretty).
    pub log_format: String,
    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,
    /// Listen address of the Prometheus exporter.
    pub metrics_addr: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_addr: "0.0.0.0:9100".to_string(),
        }
    }
}

impl ObservabilityConfig {
    /// Converts to logging options for subscriber installation.
    #[must_use]
    pub fn logging_options(&self) -> LoggingOptions {
        let format = if self.log_format.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        };
        LoggingOptions {
            level: self.log_level.to_lowercase(),
            format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_defaults() {
        let config = CacheConfig::default();
        assert!(config.namespace.is_empty());
        assert!((config.ttl_jitter_ratio - 0.1).abs() < f64::EPSILON);
        assert!(!config.compress_payload);
        assert_eq!(config.negative_ttl(), Duration::from_secs(300));
        assert_eq!(config.scan_page_size, 100);
    }

    #[test]
    fn test_entity_defaults() {
        let entities = EntityPolicies::default();
        assert_eq!(entities.scale.ttl(), Duration::from_secs(24 * 3600));
        assert!(entities.scale.singleflight);
        assert_eq!(entities.questionnaire.ttl(), Duration::from_secs(12 * 3600));
        assert_eq!(entities.assessment_status.mode, CacheMode::WriteThrough);
        assert_eq!(entities.assessment_status.ttl(), Duration::from_secs(1800));
        assert_eq!(entities.testee.mode, CacheMode::CacheAside);
        assert_eq!(entities.named().len(), 8);
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            [cache]
            namespace = "dev"
            compress_payload = true

            [cache.entities.plan]
            ttl_secs = 60
            mode = "write_through"
            "#,
        )
        .unwrap();
        assert_eq!(config.cache.namespace, "dev");
        assert!(config.cache.compress_payload);
        assert_eq!(config.cache.entities.plan.ttl_secs, 60);
        assert_eq!(config.cache.entities.plan.mode, CacheMode::WriteThrough);
        assert_eq!(config.cache.entities.scale.ttl_secs, 24 * 3600);
        assert_eq!(config.redis.pool_size, 10);
    }

    #[test]
    fn test_logging_options() {
        let mut config = ObservabilityConfig::default();
        config.log_format = "JSON".to_string();
        config.log_level = "DEBUG".to_string();
        let options = config.logging_options();
        assert_eq!(options.format, LogFormat::Json);
        assert_eq!(options.level, "debug");
    }
}
