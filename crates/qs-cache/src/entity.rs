//! Read-through and write policy for one cached entity type.

use crate::{BackgroundWriter, CacheContext, CacheError, CacheResult, Lookup, SingleFlight, TtlJitter, TypedCache};
use qs_config::{CacheMode, EntityPolicy};
use qs_core::QsResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Result of warming one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarmOutcome {
    /// Loaded from the repository and cached.
    Loaded,
    /// Already cached.
    Skipped,
    /// The repository has no such value.
    Missing,
    /// Loading or caching failed.
    Failed,
}

const WRITE_STRIPES: usize = 64;

/// Write counters striped by key hash.
///
/// A fill computed from a load is written only if no write touched its
/// stripe while the load ran.
struct WriteGenerations {
    stripes: [AtomicU64; WRITE_STRIPES],
}

impl WriteGenerations {
    fn new() -> Self {
        Self {
            stripes: std::array::from_fn(|_| AtomicU64::new(0)),
        }
    }

    fn stripe(&self, key: &str) -> &AtomicU64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let index = usize::try_from(hasher.finish() % WRITE_STRIPES as u64).unwrap_or_default();
        &self.stripes[index]
    }

    fn current(&self, key: &str) -> u64 {
        self.stripe(key).load(Ordering::SeqCst)
    }

    fn bump(&self, key: &str) {
        self.stripe(key).fetch_add(1, Ordering::SeqCst);
    }

    fn bump_all(&self) {
        for stripe in &self.stripes {
            stripe.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Cache-aside machinery shared by the decorators.
///
/// Reads check the cache first, treat a negative marker as "absent", and on a
/// miss load through the repository (optionally deduplicated) before filling
/// the cache. Fills never replace an existing entry and are dropped when a
/// write to the same key landed during the load. Cache failures are logged
/// and never returned.
pub struct EntityCache<T> {
    name: &'static str,
    policy: EntityPolicy,
    typed: TypedCache<T>,
    jitter: Arc<TtlJitter>,
    negative_ttl: Duration,
    writer: BackgroundWriter,
    flights: Arc<SingleFlight<QsResult<Option<T>>>>,
    writes: Arc<WriteGenerations>,
}

impl<T> Clone for EntityCache<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            policy: self.policy,
            typed: self.typed.clone(),
            jitter: Arc::clone(&self.jitter),
            negative_ttl: self.negative_ttl,
            writer: self.writer.clone(),
            flights: Arc::clone(&self.flights),
            writes: Arc::clone(&self.writes),
        }
    }
}

impl<T> std::fmt::Debug for EntityCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityCache")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .finish()
    }
}

impl<T> EntityCache<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Creates the cache of entity `name` under `policy`.
    #[must_use]
    pub fn new(context: &CacheContext, name: &'static str, policy: EntityPolicy) -> Self {
        Self {
            name,
            policy,
            typed: context.typed(),
            jitter: Arc::clone(context.jitter()),
            negative_ttl: context.settings().negative_ttl,
            writer: context.writer().clone(),
            flights: Arc::new(SingleFlight::new()),
            writes: Arc::new(WriteGenerations::new()),
        }
    }

    /// Entity name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// TTL, mode and singleflight settings of this entity.
    #[must_use]
    pub fn policy(&self) -> &EntityPolicy {
        &self.policy
    }

    /// Typed view over the backend.
    #[must_use]
    pub fn typed(&self) -> &TypedCache<T> {
        &self.typed
    }

    /// Jittered TTL of a regular entry.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.jitter.apply(self.policy.ttl())
    }

    /// Jittered TTL of a negative marker.
    #[must_use]
    pub fn negative_ttl(&self) -> Duration {
        self.jitter.apply(self.negative_ttl)
    }

    /// Cache-aside read.
    ///
    /// `Ok(None)` from the loader is cached as a negative marker. Loader
    /// errors are returned unchanged and nothing is cached.
    pub async fn read_through<F, Fut>(&self, key: &str, load: F) -> QsResult<Option<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = QsResult<Option<T>>>,
    {
        match self.typed.lookup(key).await {
            Ok(Lookup::Hit(value)) => {
                debug!(entity = self.name, key, "Cache hit");
                return Ok(Some(value));
            }
            Ok(Lookup::Absent) => {
                debug!(entity = self.name, key, "Negative cache hit");
                return Ok(None);
            }
            Err(CacheError::NotFound) => debug!(entity = self.name, key, "Cache miss"),
            Err(e) => warn!(
                entity = self.name,
                key,
                error = %e,
                "Cache read failed, falling back to repository"
            ),
        }

        let fetch = || async {
            let seen = self.writes.current(key);
            let loaded = load().await;
            if let Ok(value) = &loaded {
                self.fill(key, value.clone(), seen).await;
            }
            loaded
        };

        if self.policy.singleflight {
            self.flights.run(key, fetch).await
        } else {
            fetch().await
        }
    }

    /// Fills the cache after a miss: write-through entities are written
    /// before returning, cache-aside entities on the background writer.
    async fn fill(&self, key: &str, value: Option<T>, seen: u64) {
        match self.policy.mode {
            CacheMode::WriteThrough => {
                if self.writes.current(key) != seen {
                    debug!(entity = self.name, key, "Entry written during load, skipping fill");
                    return;
                }
                let ttl = if value.is_some() { self.ttl() } else { self.negative_ttl() };
                if let Err(e) = fill_if_vacant(&self.typed, key, value.as_ref(), ttl).await {
                    warn!(entity = self.name, key, error = %e, "Failed to fill cache entry");
                }
            }
            CacheMode::CacheAside => {
                self.populate(key, value, seen);
            }
        }
    }

    /// Schedules a best-effort write of `value` (or a negative marker).
    fn populate(&self, key: &str, value: Option<T>, seen: u64) -> bool {
        let typed = self.typed.clone();
        let writes = Arc::clone(&self.writes);
        let key = key.to_string();
        let name = self.name;
        let ttl = if value.is_some() { self.ttl() } else { self.negative_ttl() };

        self.writer.spawn(name, async move {
            if writes.current(&key) != seen {
                debug!(entity = name, key = %key, "Entry written during load, skipping populate");
                return;
            }
            if let Err(e) = fill_if_vacant(&typed, &key, value.as_ref(), ttl).await {
                warn!(entity = name, key = %key, error = %e, "Failed to populate cache");
            }
        })
    }

    /// Writes `value` now. Returns false if the cache rejected it.
    pub async fn store(&self, key: &str, value: &T) -> bool {
        self.writes.bump(key);
        match self.typed.set(key, value, self.ttl()).await {
            Ok(()) => true,
            Err(e) => {
                warn!(entity = self.name, key, error = %e, "Failed to write cache entry");
                false
            }
        }
    }

    /// Deletes `key` now. Returns false if the cache could not be reached.
    pub async fn invalidate(&self, key: &str) -> bool {
        self.writes.bump(key);
        match self.typed.delete(key).await {
            Ok(()) => {
                debug!(entity = self.name, key, "Invalidated cache entry");
                true
            }
            Err(e) => {
                warn!(entity = self.name, key, error = %e, "Failed to invalidate cache entry");
                false
            }
        }
    }

    /// Deletes every key matching `pattern` before returning.
    ///
    /// Returns false if the cache could not be reached.
    pub async fn invalidate_pattern(&self, pattern: &str) -> bool {
        self.writes.bump_all();
        match self.typed.raw().delete_pattern(pattern).await {
            Ok(deleted) => {
                debug!(entity = self.name, pattern, deleted, "Invalidated cache keys by pattern");
                true
            }
            Err(e) => {
                warn!(entity = self.name, pattern, error = %e, "Failed to invalidate cache keys by pattern");
                false
            }
        }
    }

    /// Applies the entity's write policy after a successful write.
    pub async fn on_write(&self, key: &str, value: &T) {
        match self.policy.mode {
            CacheMode::WriteThrough => {
                if !self.store(key, value).await {
                    // A stale entry is worse than none.
                    self.invalidate(key).await;
                }
            }
            CacheMode::CacheAside => {
                self.invalidate(key).await;
            }
        }
    }

    /// Loads and caches `key` unless it is already present.
    pub async fn warm<F, Fut>(&self, key: &str, load: F) -> WarmOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = QsResult<Option<T>>>,
    {
        match self.typed.exists(key).await {
            Ok(true) => return WarmOutcome::Skipped,
            Ok(false) => {}
            Err(e) => warn!(entity = self.name, key, error = %e, "Cache exists check failed during warmup"),
        }

        match load().await {
            Ok(Some(value)) => {
                if self.store(key, &value).await {
                    WarmOutcome::Loaded
                } else {
                    WarmOutcome::Failed
                }
            }
            Ok(None) => WarmOutcome::Missing,
            Err(e) => {
                warn!(entity = self.name, key, error = %e, "Warmup load failed");
                WarmOutcome::Failed
            }
        }
    }
}

async fn fill_if_vacant<T>(typed: &TypedCache<T>, key: &str, value: Option<&T>, ttl: Duration) -> CacheResult<bool>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    match value {
        Some(value) => typed.set_if_absent(key, value, ttl).await,
        None => typed.set_absent_if_vacant(key, ttl).await,
    }
}
