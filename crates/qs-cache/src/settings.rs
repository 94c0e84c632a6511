//! Immutable cache settings built once from configuration.

use qs_config::{CacheConfig, EntityPolicies};
use std::time::Duration;

/// Settings shared by every cache component.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// Key prefix. Empty means unprefixed.
    pub namespace: String,
    /// TTL jitter ratio in [0, 1].
    pub jitter_ratio: f64,
    /// Gzip payloads on write.
    pub compress: bool,
    /// Base TTL of negative-cache markers.
    pub negative_ttl: Duration,
    /// SCAN COUNT hint.
    pub scan_page_size: u32,
    /// Maximum outstanding background writes.
    pub background_writers: usize,
    /// Per-entity TTL and write policy.
    pub entities: EntityPolicies,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self::from(&CacheConfig::default())
    }
}

impl From<&CacheConfig> for CacheSettings {
    fn from(config: &CacheConfig) -> Self {
        Self {
            namespace: config.namespace.trim().to_string(),
            jitter_ratio: config.ttl_jitter_ratio.clamp(0.0, 1.0),
            compress: config.compress_payload,
            negative_ttl: config.negative_ttl(),
            scan_page_size: config.scan_page_size.max(1),
            background_writers: config.background_writers.max(1),
            entities: config.entities.clone(),
        }
    }
}

impl CacheSettings {
    /// Returns a copy with another namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Returns a copy with payload compression switched.
    #[must_use]
    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Returns a copy with another jitter ratio.
    #[must_use]
    pub fn with_jitter_ratio(mut self, ratio: f64) -> Self {
        self.jitter_ratio = ratio.clamp(0.0, 1.0);
        self
    }
}
