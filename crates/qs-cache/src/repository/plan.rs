//! Cached assessment plan repository.

use crate::{CacheContext, CacheKeyBuilder, EntityCache, WarmupReport};
use async_trait::async_trait;
use qs_core::domain::AssessmentPlan;
use qs_core::{OrgId, PlanId, QsResult, TesteeId};
use qs_repository::PlanRepository;
use std::sync::Arc;

/// Plan repository with cache-aside reads by id.
pub struct CachedPlanRepository {
    inner: Arc<dyn PlanRepository>,
    entity: EntityCache<AssessmentPlan>,
    keys: CacheKeyBuilder,
}

impl CachedPlanRepository {
    /// Decorates `inner` with the plan cache of `context`.
    #[must_use]
    pub fn new(inner: Arc<dyn PlanRepository>, context: &CacheContext) -> Self {
        Self {
            inner,
            entity: context.entity("plan", context.settings().entities.plan),
            keys: context.keys().clone(),
        }
    }

    /// Preloads plans by id.
    pub async fn warmup(&self, ids: &[u64]) -> WarmupReport {
        let mut report = WarmupReport::new("plan");
        for &raw in ids {
            let id = PlanId::new(raw);
            let outcome = self
                .entity
                .warm(&self.keys.plan(id), || self.inner.find_by_id(id))
                .await;
            report.record(outcome);
        }
        report
    }
}

#[async_trait]
impl PlanRepository for CachedPlanRepository {
    async fn save(&self, plan: &AssessmentPlan) -> QsResult<AssessmentPlan> {
        let saved = self.inner.save(plan).await?;
        self.entity.on_write(&self.keys.plan(saved.id), &saved).await;
        Ok(saved)
    }

    async fn find_by_id(&self, id: PlanId) -> QsResult<Option<AssessmentPlan>> {
        self.entity
            .read_through(&self.keys.plan(id), || self.inner.find_by_id(id))
            .await
    }

    async fn find_by_scale_code(&self, scale_code: &str) -> QsResult<Vec<AssessmentPlan>> {
        self.inner.find_by_scale_code(scale_code).await
    }

    async fn find_active_plans(&self) -> QsResult<Vec<AssessmentPlan>> {
        self.inner.find_active_plans().await
    }

    async fn find_by_testee_id(&self, testee_id: TesteeId) -> QsResult<Vec<AssessmentPlan>> {
        self.inner.find_by_testee_id(testee_id).await
    }

    async fn find_list(
        &self,
        org_id: OrgId,
        scale_code: &str,
        status: &str,
        page: u32,
        page_size: u32,
    ) -> QsResult<(Vec<AssessmentPlan>, u64)> {
        self.inner.find_list(org_id, scale_code, status, page, page_size).await
    }
}
