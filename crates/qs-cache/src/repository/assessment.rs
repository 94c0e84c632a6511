//! Cached assessment repository.
//!
//! Detail reads are cache-aside. Every successful write also refreshes the
//! status projection and sweeps the owner's cached assessment lists before
//! returning.

use super::assessment_list::MyAssessmentListCache;
use super::assessment_status::{AssessmentStatusCache, AssessmentStatusView};
use crate::{CacheContext, CacheKeyBuilder, EntityCache, WarmOutcome, WarmupReport};
use async_trait::async_trait;
use qs_core::domain::{Assessment, AssessmentStatus};
use qs_core::{
    AnswerSheetId, AssessmentId, OrgId, Page, PageRequest, PlanId, QsResult, ScreeningProjectId, TesteeId,
};
use qs_repository::AssessmentRepository;
use std::sync::Arc;

/// Assessment repository with cached details, status projections and per-testee lists.
pub struct CachedAssessmentRepository {
    inner: Arc<dyn AssessmentRepository>,
    detail: EntityCache<Assessment>,
    keys: CacheKeyBuilder,
    status: Arc<AssessmentStatusCache>,
    lists: Arc<MyAssessmentListCache>,
}

impl CachedAssessmentRepository {
    /// Decorates `inner` with the caches of `context`.
    #[must_use]
    pub fn new(inner: Arc<dyn AssessmentRepository>, context: &CacheContext) -> Self {
        Self {
            inner,
            detail: context.entity("assessment_detail", context.settings().entities.assessment_detail),
            keys: context.keys().clone(),
            status: Arc::new(AssessmentStatusCache::new(context)),
            lists: Arc::new(MyAssessmentListCache::new(context)),
        }
    }

    /// The status projection cache.
    #[must_use]
    pub fn status_cache(&self) -> &Arc<AssessmentStatusCache> {
        &self.status
    }

    /// The per-testee list cache.
    #[must_use]
    pub fn list_cache(&self) -> &Arc<MyAssessmentListCache> {
        &self.lists
    }

    /// Returns the status projection of an assessment.
    pub async fn find_status(&self, id: AssessmentId) -> QsResult<Option<AssessmentStatusView>> {
        self.status.get(id, || self.inner.find_by_id(id)).await
    }

    /// Preloads assessment details and status projections.
    pub async fn warmup(&self, ids: &[u64]) -> WarmupReport {
        let mut report = WarmupReport::new("assessment");
        for &raw in ids {
            let id = AssessmentId::new(raw);
            let detail = self
                .detail
                .warm(&self.keys.assessment_detail(id), || self.inner.find_by_id(id))
                .await;
            if detail != WarmOutcome::Missing {
                self.status.warm(id, || self.inner.find_by_id(id)).await;
            }
            report.record(detail);
        }
        report
    }

    async fn after_write(&self, saved: &Assessment) {
        self.detail.on_write(&self.keys.assessment_detail(saved.id), saved).await;
        self.status.update(saved).await;
        self.lists.invalidate(saved.testee_id).await;
    }

    async fn owner_of(&self, id: AssessmentId) -> Option<TesteeId> {
        if let Ok(cached) = self.detail.typed().get(&self.keys.assessment_detail(id)).await {
            return Some(cached.testee_id);
        }
        self.inner.find_by_id(id).await.ok().flatten().map(|a| a.testee_id)
    }
}

#[async_trait]
impl AssessmentRepository for CachedAssessmentRepository {
    async fn save(&self, assessment: &Assessment) -> QsResult<Assessment> {
        let saved = self.inner.save(assessment).await?;
        self.after_write(&saved).await;
        Ok(saved)
    }

    async fn find_by_id(&self, id: AssessmentId) -> QsResult<Option<Assessment>> {
        self.detail
            .read_through(&self.keys.assessment_detail(id), || self.inner.find_by_id(id))
            .await
    }

    async fn delete(&self, id: AssessmentId) -> QsResult<()> {
        let owner = self.owner_of(id).await;
        self.inner.delete(id).await?;
        self.detail.invalidate(&self.keys.assessment_detail(id)).await;
        self.status.delete(id).await;
        if let Some(testee_id) = owner {
            self.lists.invalidate(testee_id).await;
        }
        Ok(())
    }

    async fn find_by_answer_sheet_id(&self, answer_sheet_id: AnswerSheetId) -> QsResult<Option<Assessment>> {
        self.inner.find_by_answer_sheet_id(answer_sheet_id).await
    }

    async fn find_by_testee_id(&self, testee_id: TesteeId, page: PageRequest) -> QsResult<(Vec<Assessment>, u64)> {
        let list = self
            .lists
            .get_or_load(testee_id, "", page, || async move {
                self.inner
                    .find_by_testee_id(testee_id, page)
                    .await
                    .map(|(items, total)| Page::new(items, page, total))
            })
            .await?;
        Ok((list.items, list.total))
    }

    async fn find_by_testee_and_scale(
        &self,
        testee_id: TesteeId,
        scale_code: &str,
        page: PageRequest,
    ) -> QsResult<(Vec<Assessment>, u64)> {
        self.inner.find_by_testee_and_scale(testee_id, scale_code, page).await
    }

    async fn find_by_plan_id(&self, plan_id: PlanId, page: PageRequest) -> QsResult<(Vec<Assessment>, u64)> {
        self.inner.find_by_plan_id(plan_id, page).await
    }

    async fn find_by_screening_project_id(
        &self,
        project_id: ScreeningProjectId,
        page: PageRequest,
    ) -> QsResult<(Vec<Assessment>, u64)> {
        self.inner.find_by_screening_project_id(project_id, page).await
    }

    async fn count_by_status(&self, status: AssessmentStatus) -> QsResult<u64> {
        self.inner.count_by_status(status).await
    }

    async fn count_by_testee_and_status(&self, testee_id: TesteeId, status: AssessmentStatus) -> QsResult<u64> {
        self.inner.count_by_testee_and_status(testee_id, status).await
    }

    async fn count_by_org_and_status(&self, org_id: OrgId, status: AssessmentStatus) -> QsResult<u64> {
        self.inner.count_by_org_and_status(org_id, status).await
    }

    async fn find_by_ids(&self, ids: &[AssessmentId]) -> QsResult<Vec<Assessment>> {
        self.inner.find_by_ids(ids).await
    }

    async fn find_by_org_id(
        &self,
        org_id: OrgId,
        status: Option<AssessmentStatus>,
        page: PageRequest,
    ) -> QsResult<(Vec<Assessment>, u64)> {
        self.inner.find_by_org_id(org_id, status, page).await
    }

    async fn find_pending_submission(&self, page: PageRequest) -> QsResult<(Vec<Assessment>, u64)> {
        self.inner.find_pending_submission(page).await
    }
}
