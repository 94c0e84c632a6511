//! Global published scale list.
//!
//! The whole list lives under one key and pages are sliced on read. A short
//! node-local memo keeps hot pages from being decoded on every request.
//!
//! Every change to the cached list advances a generation counter. A rebuild
//! or a memo insert that started under an older generation is discarded.

use crate::{BackgroundWriter, CacheContext, CacheError, CacheResult, TtlJitter, TypedCache};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use qs_config::EntityPolicy;
use qs_core::domain::ScaleSummary;
use qs_core::{Page, PageRequest, QsResult, QueryConditions};
use qs_repository::ScaleRepository;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Page size used when reloading the list from the repository.
pub const REBUILD_PAGE_SIZE: u32 = 200;

/// Lifetime of memoized pages.
pub const PAGE_MEMO_TTL: Duration = Duration::from_secs(30);

/// Cached value of the published list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleListSnapshot {
    pub scales: Vec<ScaleSummary>,
    pub total_count: u64,
    pub rebuilt_at: DateTime<Utc>,
}

impl ScaleListSnapshot {
    fn page(&self, page: u32, page_size: u32) -> Page<ScaleSummary> {
        let start = (page.saturating_sub(1) as usize).saturating_mul(page_size as usize);
        let items = self
            .scales
            .iter()
            .skip(start)
            .take(page_size as usize)
            .cloned()
            .collect();
        Page::new(items, PageRequest { page, page_size }, self.total_count)
    }
}

/// Filter identifying the published list.
#[must_use]
pub fn published_conditions() -> QueryConditions {
    QueryConditions::new().with("status", "published")
}

/// Cache of every published scale summary.
pub struct ScaleListCache {
    repository: Arc<dyn ScaleRepository>,
    typed: TypedCache<ScaleListSnapshot>,
    key: String,
    policy: EntityPolicy,
    jitter: Arc<TtlJitter>,
    writer: BackgroundWriter,
    memo: Mutex<HashMap<(u32, u32), (Instant, Page<ScaleSummary>)>>,
    generation: AtomicU64,
}

impl ScaleListCache {
    /// `repository` must be the undecorated source of truth.
    #[must_use]
    pub fn new(repository: Arc<dyn ScaleRepository>, context: &CacheContext) -> Self {
        Self {
            repository,
            typed: context.typed(),
            key: context.keys().scale_list(),
            policy: context.settings().entities.scale_list,
            jitter: Arc::clone(context.jitter()),
            writer: context.writer().clone(),
            memo: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Cache key of the list.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Reloads every published scale and replaces the cached list.
    ///
    /// When nothing is published the key is deleted. Returns the number of
    /// scales cached.
    pub async fn rebuild(&self) -> QsResult<usize> {
        let seen = self.generation.load(Ordering::SeqCst);
        let conditions = published_conditions();
        let total = self.repository.count_with_conditions(&conditions).await?;

        if total == 0 {
            if self.superseded(seen) {
                return Ok(0);
            }
            self.typed.delete(&self.key).await?;
            self.advance();
            debug!(key = %self.key, "No published scales, list cache cleared");
            return Ok(0);
        }

        let mut scales = Vec::with_capacity(usize::try_from(total).unwrap_or_default());
        let mut page = 1;
        loop {
            let batch = self
                .repository
                .find_summary_list(page, REBUILD_PAGE_SIZE, &conditions)
                .await?;
            let fetched = batch.len();
            scales.extend(batch);
            if fetched < REBUILD_PAGE_SIZE as usize || scales.len() as u64 >= total {
                break;
            }
            page += 1;
        }

        let snapshot = ScaleListSnapshot {
            total_count: scales.len() as u64,
            scales,
            rebuilt_at: Utc::now(),
        };
        if self.superseded(seen) {
            return Ok(0);
        }
        let ttl = self.jitter.apply(self.policy.ttl());
        self.typed.set(&self.key, &snapshot, ttl).await?;
        self.advance();

        info!(key = %self.key, count = snapshot.total_count, "Rebuilt published scale list cache");
        Ok(snapshot.scales.len())
    }

    /// Schedules [`rebuild`](Self::rebuild) on the background writer.
    ///
    /// Skipped when the writer is saturated.
    pub fn schedule_rebuild(self: &Arc<Self>) -> bool {
        let list = Arc::clone(self);
        self.writer.spawn("scale_list", async move {
            list.rebuild_logged().await;
        })
    }

    /// Drops the cached list after a scale write and queues a rebuild.
    ///
    /// The key is deleted before returning, so readers fall back to the
    /// repository until the rebuild lands. The rebuild waits for a writer
    /// permit rather than being skipped.
    pub async fn refresh(self: &Arc<Self>) -> bool {
        self.advance();
        if let Err(e) = self.typed.delete(&self.key).await {
            warn!(key = %self.key, error = %e, "Failed to drop published scale list cache");
        }

        let list = Arc::clone(self);
        self.writer
            .spawn_queued("scale_list", async move {
                list.rebuild_logged().await;
            })
            .await
    }

    async fn rebuild_logged(&self) {
        if let Err(e) = self.rebuild().await {
            warn!(key = %self.key, error = %e, "Failed to rebuild published scale list cache");
        }
    }

    fn advance(&self) {
        let mut memo = self.memo.lock();
        self.generation.fetch_add(1, Ordering::SeqCst);
        memo.clear();
    }

    fn superseded(&self, seen: u64) -> bool {
        let superseded = self.generation.load(Ordering::SeqCst) != seen;
        if superseded {
            debug!(key = %self.key, "Published scale list changed during rebuild, discarding result");
        }
        superseded
    }

    /// Returns one page of the cached list.
    ///
    /// `NotFound` means the list is not cached. Pages past the end are empty.
    pub async fn get_page(&self, page: u32, page_size: u32) -> CacheResult<Page<ScaleSummary>> {
        if page == 0 || page_size == 0 {
            return Err(CacheError::NotFound);
        }

        if let Some(hit) = self.memoized(page, page_size) {
            return Ok(hit);
        }

        let seen = self.generation.load(Ordering::SeqCst);
        let snapshot = self.typed.get(&self.key).await?;
        let result = snapshot.page(page, page_size);

        let mut memo = self.memo.lock();
        if self.generation.load(Ordering::SeqCst) == seen {
            memo.insert((page, page_size), (Instant::now() + PAGE_MEMO_TTL, result.clone()));
        }
        Ok(result)
    }

    /// Drops every memoized page of this node.
    pub fn clear_memo(&self) {
        self.memo.lock().clear();
    }

    fn memoized(&self, page: u32, page_size: u32) -> Option<Page<ScaleSummary>> {
        let mut memo = self.memo.lock();
        match memo.get(&(page, page_size)) {
            Some((expires_at, hit)) if *expires_at > Instant::now() => Some(hit.clone()),
            Some(_) => {
                memo.remove(&(page, page_size));
                None
            }
            None => None,
        }
    }
}

impl std::fmt::Debug for ScaleListCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScaleListCache")
            .field("key", &self.key)
            .field("memoized_pages", &self.memo.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Cache, CacheSettings, MemoryCache};
    use async_trait::async_trait;
    use qs_core::domain::{MedicalScale, ScaleStatus};
    use qs_repository::InMemoryScaleRepository;

    /// Returns reads only after a delay, after the value was taken.
    struct LaggingReads {
        inner: MemoryCache,
        lag: Duration,
    }

    #[async_trait]
    impl Cache for LaggingReads {
        async fn get(&self, key: &str) -> CacheResult<Vec<u8>> {
            let value = self.inner.get(key).await;
            tokio::time::sleep(self.lag).await;
            value
        }

        async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<()> {
            self.inner.set(key, value, ttl).await
        }

        async fn set_if_absent(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<bool> {
            self.inner.set_if_absent(key, value, ttl).await
        }

        async fn delete(&self, key: &str) -> CacheResult<()> {
            self.inner.delete(key).await
        }

        async fn exists(&self, key: &str) -> CacheResult<bool> {
            self.inner.exists(key).await
        }

        async fn mget(&self, keys: &[String]) -> CacheResult<HashMap<String, Vec<u8>>> {
            self.inner.mget(keys).await
        }

        async fn mset(&self, entries: &HashMap<String, Vec<u8>>, ttl: Duration) -> CacheResult<()> {
            self.inner.mset(entries, ttl).await
        }

        async fn delete_pattern(&self, pattern: &str) -> CacheResult<u64> {
            self.inner.delete_pattern(pattern).await
        }

        async fn ping(&self) -> CacheResult<()> {
            self.inner.ping().await
        }
    }

    fn published(code: &str) -> MedicalScale {
        MedicalScale::new(code, code, format!("Q-{code}")).with_status(ScaleStatus::Published)
    }

    #[tokio::test(start_paused = true)]
    async fn test_reader_of_replaced_snapshot_is_not_memoized() {
        let repository = Arc::new(InMemoryScaleRepository::with_scales(vec![published("A1")]));
        let cache: Arc<dyn Cache> = Arc::new(LaggingReads {
            inner: MemoryCache::new(),
            lag: Duration::from_millis(100),
        });
        let context = CacheContext::new(cache, CacheSettings::default());
        let list = Arc::new(ScaleListCache::new(repository.clone(), &context));
        list.rebuild().await.unwrap();

        let reader = {
            let list = Arc::clone(&list);
            tokio::spawn(async move { list.get_page(1, 10).await })
        };
        tokio::task::yield_now().await;

        repository.create(&published("A2")).await.unwrap();
        assert_eq!(list.rebuild().await.unwrap(), 2);

        assert_eq!(reader.await.unwrap().unwrap().len(), 1);
        assert_eq!(list.get_page(1, 10).await.unwrap().len(), 2);
    }

    fn summary(code: &str) -> ScaleSummary {
        ScaleSummary::from(&qs_core::domain::MedicalScale::new(code, code, format!("Q-{code}")))
    }

    #[test]
    fn test_snapshot_paging() {
        let snapshot = ScaleListSnapshot {
            scales: ["A", "B", "C", "D", "E"].map(summary).to_vec(),
            total_count: 5,
            rebuilt_at: Utc::now(),
        };

        let second = snapshot.page(2, 2);
        assert_eq!(second.items.iter().map(|s| s.code.as_str()).collect::<Vec<_>>(), ["C", "D"]);
        assert_eq!(second.total, 5);
        assert_eq!(second.total_pages, 3);

        let last = snapshot.page(3, 2);
        assert_eq!(last.len(), 1);
        assert!(snapshot.page(4, 2).is_empty());
    }
}
