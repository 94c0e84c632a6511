//! Shared wiring handed to every cached repository.

use crate::{BackgroundWriter, Cache, CacheKeyBuilder, CacheSettings, EntityCache, PayloadCodec, TtlJitter, TypedCache};
use qs_config::EntityPolicy;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Backend, settings and helpers shared by the cache components of one process.
#[derive(Clone)]
pub struct CacheContext {
    cache: Arc<dyn Cache>,
    settings: Arc<CacheSettings>,
    keys: CacheKeyBuilder,
    jitter: Arc<TtlJitter>,
    writer: BackgroundWriter,
}

impl CacheContext {
    /// Builds the shared context over `cache`.
    #[must_use]
    pub fn new(cache: Arc<dyn Cache>, settings: CacheSettings) -> Self {
        Self {
            keys: CacheKeyBuilder::new(settings.namespace.clone()),
            jitter: Arc::new(TtlJitter::new(settings.jitter_ratio)),
            writer: BackgroundWriter::new(settings.background_writers),
            settings: Arc::new(settings),
            cache,
        }
    }

    /// Replaces the jitter source, e.g. with a seeded one.
    #[must_use]
    pub fn with_jitter(mut self, jitter: TtlJitter) -> Self {
        self.jitter = Arc::new(jitter);
        self
    }

    /// The byte cache shared by every component.
    #[must_use]
    pub fn cache(&self) -> &Arc<dyn Cache> {
        &self.cache
    }

    /// Settings the context was built with.
    #[must_use]
    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    /// Key builder carrying the configured namespace.
    #[must_use]
    pub fn keys(&self) -> &CacheKeyBuilder {
        &self.keys
    }

    /// Jitter source applied to every TTL.
    #[must_use]
    pub fn jitter(&self) -> &Arc<TtlJitter> {
        &self.jitter
    }

    /// Writer running background populates and rebuilds.
    #[must_use]
    pub fn writer(&self) -> &BackgroundWriter {
        &self.writer
    }

    /// Payload codec matching the compression setting.
    #[must_use]
    pub fn codec(&self) -> PayloadCodec {
        PayloadCodec::new(self.settings.compress)
    }

    /// Typed view over the shared backend.
    #[must_use]
    pub fn typed<T>(&self) -> TypedCache<T>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
    {
        TypedCache::new(Arc::clone(&self.cache), self.codec())
    }

    /// Read-through helper for one entity type.
    #[must_use]
    pub fn entity<T>(&self, name: &'static str, policy: EntityPolicy) -> EntityCache<T>
    where
        T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    {
        EntityCache::new(self, name, policy)
    }
}

impl std::fmt::Debug for CacheContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheContext")
            .field("settings", &self.settings)
            .field("writer", &self.writer)
            .finish()
    }
}
