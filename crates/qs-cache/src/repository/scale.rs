//! Cached medical scale repository.

use super::scale_list::ScaleListCache;
use crate::{CacheContext, CacheError, CacheKeyBuilder, EntityCache, WarmupReport};
use async_trait::async_trait;
use qs_core::domain::{MedicalScale, ScaleSummary};
use qs_core::{QsResult, QueryConditions};
use qs_repository::ScaleRepository;
use std::sync::Arc;
use tracing::warn;

/// Scale repository with cache-aside reads by code and a cached published list.
pub struct CachedScaleRepository {
    inner: Arc<dyn ScaleRepository>,
    entity: EntityCache<MedicalScale>,
    keys: CacheKeyBuilder,
    list: Arc<ScaleListCache>,
}

impl CachedScaleRepository {
    /// Decorates `inner` with the scale caches of `context`.
    #[must_use]
    pub fn new(inner: Arc<dyn ScaleRepository>, context: &CacheContext) -> Self {
        Self {
            entity: context.entity("scale", context.settings().entities.scale),
            keys: context.keys().clone(),
            list: Arc::new(ScaleListCache::new(Arc::clone(&inner), context)),
            inner,
        }
    }

    /// The published list cache fed by this repository's writes.
    #[must_use]
    pub fn list_cache(&self) -> &Arc<ScaleListCache> {
        &self.list
    }

    /// Preloads scales by code.
    pub async fn warmup(&self, codes: &[String]) -> WarmupReport {
        let mut report = WarmupReport::new("scale");
        for code in codes {
            let outcome = self
                .entity
                .warm(&self.keys.scale(code), || self.inner.find_by_code(code))
                .await;
            report.record(outcome);
        }
        report
    }
}

#[async_trait]
impl ScaleRepository for CachedScaleRepository {
    async fn create(&self, scale: &MedicalScale) -> QsResult<MedicalScale> {
        let created = self.inner.create(scale).await?;
        self.entity.store(&self.keys.scale(&created.code), &created).await;
        self.list.refresh().await;
        Ok(created)
    }

    async fn find_by_code(&self, code: &str) -> QsResult<Option<MedicalScale>> {
        self.entity
            .read_through(&self.keys.scale(code), || self.inner.find_by_code(code))
            .await
    }

    async fn find_by_questionnaire_code(&self, questionnaire_code: &str) -> QsResult<Option<MedicalScale>> {
        self.inner.find_by_questionnaire_code(questionnaire_code).await
    }

    async fn find_summary_list(
        &self,
        page: u32,
        page_size: u32,
        conditions: &QueryConditions,
    ) -> QsResult<Vec<ScaleSummary>> {
        if !conditions.is_only("status", "published") || page == 0 || page_size == 0 {
            return self.inner.find_summary_list(page, page_size, conditions).await;
        }

        match self.list.get_page(page, page_size).await {
            Ok(cached) => return Ok(cached.items),
            Err(CacheError::NotFound) => {
                let items = self.inner.find_summary_list(page, page_size, conditions).await?;
                self.list.schedule_rebuild();
                return Ok(items);
            }
            Err(e) => warn!(key = %self.list.key(), error = %e, "Scale list cache read failed"),
        }

        self.inner.find_summary_list(page, page_size, conditions).await
    }

    async fn count_with_conditions(&self, conditions: &QueryConditions) -> QsResult<u64> {
        self.inner.count_with_conditions(conditions).await
    }

    async fn update(&self, scale: &MedicalScale) -> QsResult<MedicalScale> {
        let updated = self.inner.update(scale).await?;
        self.entity.on_write(&self.keys.scale(&updated.code), &updated).await;
        self.list.refresh().await;
        Ok(updated)
    }

    async fn remove(&self, code: &str) -> QsResult<()> {
        self.inner.remove(code).await?;
        self.entity.invalidate(&self.keys.scale(code)).await;
        self.list.refresh().await;
        Ok(())
    }

    async fn exists_by_code(&self, code: &str) -> QsResult<bool> {
        self.inner.exists_by_code(code).await
    }
}
