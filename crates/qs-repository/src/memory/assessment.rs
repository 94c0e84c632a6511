use crate::AssessmentRepository;
use async_trait::async_trait;
use parking_lot::RwLock;
use qs_core::domain::{Assessment, AssessmentStatus};
use qs_core::{
    AnswerSheetId, AssessmentId, OrgId, PageRequest, PlanId, QsError, QsResult, ScreeningProjectId, TesteeId,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Assessment store backed by a map.
#[derive(Default)]
pub struct InMemoryAssessmentRepository {
    assessments: RwLock<HashMap<AssessmentId, Assessment>>,
    sequence: AtomicU64,
}

impl InMemoryAssessmentRepository {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects matching assessments, newest first, and pages them.
    fn query<F>(&self, page: PageRequest, predicate: F) -> (Vec<Assessment>, u64)
    where
        F: Fn(&Assessment) -> bool,
    {
        let mut items: Vec<Assessment> = self
            .assessments
            .read()
            .values()
            .filter(|a| predicate(a))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.id.cmp(&a.id));
        super::paginate(items, page)
    }

    fn count<F>(&self, predicate: F) -> u64
    where
        F: Fn(&Assessment) -> bool,
    {
        self.assessments.read().values().filter(|a| predicate(a)).count() as u64
    }
}

impl std::fmt::Debug for InMemoryAssessmentRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryAssessmentRepository")
            .field("len", &self.assessments.read().len())
            .finish()
    }
}

#[async_trait]
impl AssessmentRepository for InMemoryAssessmentRepository {
    async fn save(&self, assessment: &Assessment) -> QsResult<Assessment> {
        let mut stored = assessment.clone();
        if stored.id.is_zero() {
            stored.id = AssessmentId::new(self.sequence.fetch_add(1, Ordering::Relaxed) + 1);
        }
        self.assessments.write().insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: AssessmentId) -> QsResult<Option<Assessment>> {
        Ok(self.assessments.read().get(&id).cloned())
    }

    async fn delete(&self, id: AssessmentId) -> QsResult<()> {
        self.assessments
            .write()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| QsError::not_found("Assessment", id))
    }

    async fn find_by_answer_sheet_id(&self, answer_sheet_id: AnswerSheetId) -> QsResult<Option<Assessment>> {
        Ok(self
            .assessments
            .read()
            .values()
            .find(|a| a.answer_sheet_id == answer_sheet_id)
            .cloned())
    }

    async fn find_by_testee_id(&self, testee_id: TesteeId, page: PageRequest) -> QsResult<(Vec<Assessment>, u64)> {
        Ok(self.query(page, |a| a.testee_id == testee_id))
    }

    async fn find_by_testee_and_scale(
        &self,
        testee_id: TesteeId,
        scale_code: &str,
        page: PageRequest,
    ) -> QsResult<(Vec<Assessment>, u64)> {
        Ok(self.query(page, |a| {
            a.testee_id == testee_id && a.scale_code.as_deref() == Some(scale_code)
        }))
    }

    async fn find_by_plan_id(&self, plan_id: PlanId, page: PageRequest) -> QsResult<(Vec<Assessment>, u64)> {
        Ok(self.query(page, |a| a.plan_id == Some(plan_id)))
    }

    async fn find_by_screening_project_id(
        &self,
        project_id: ScreeningProjectId,
        page: PageRequest,
    ) -> QsResult<(Vec<Assessment>, u64)> {
        Ok(self.query(page, |a| a.screening_project_id == Some(project_id)))
    }

    async fn count_by_status(&self, status: AssessmentStatus) -> QsResult<u64> {
        Ok(self.count(|a| a.status == status))
    }

    async fn count_by_testee_and_status(&self, testee_id: TesteeId, status: AssessmentStatus) -> QsResult<u64> {
        Ok(self.count(|a| a.testee_id == testee_id && a.status == status))
    }

    async fn count_by_org_and_status(&self, org_id: OrgId, status: AssessmentStatus) -> QsResult<u64> {
        Ok(self.count(|a| a.org_id == org_id && a.status == status))
    }

    async fn find_by_ids(&self, ids: &[AssessmentId]) -> QsResult<Vec<Assessment>> {
        let map = self.assessments.read();
        Ok(ids.iter().filter_map(|id| map.get(id).cloned()).collect())
    }

    async fn find_by_org_id(
        &self,
        org_id: OrgId,
        status: Option<AssessmentStatus>,
        page: PageRequest,
    ) -> QsResult<(Vec<Assessment>, u64)> {
        Ok(self.query(page, |a| a.org_id == org_id && status.is_none_or(|s| a.status == s)))
    }

    async fn find_pending_submission(&self, page: PageRequest) -> QsResult<(Vec<Assessment>, u64)> {
        Ok(self.query(page, |a| a.status == AssessmentStatus::Pending))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assessment(testee: u64, sheet: u64) -> Assessment {
        Assessment::new(OrgId::new(1), TesteeId::new(testee), "Q-PHQ9", AnswerSheetId::new(sheet))
    }

    #[tokio::test]
    async fn test_save_assigns_id_and_upserts() {
        let repo = InMemoryAssessmentRepository::new();
        let mut saved = repo.save(&assessment(1, 10)).await.unwrap();
        assert!(!saved.id.is_zero());
        saved.submit();
        repo.save(&saved).await.unwrap();
        let found = repo.find_by_id(saved.id).await.unwrap().unwrap();
        assert_eq!(found.status, AssessmentStatus::Submitted);
        assert_eq!(repo.count_by_status(AssessmentStatus::Submitted).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_find_by_testee_newest_first() {
        let repo = InMemoryAssessmentRepository::new();
        for sheet in 1..=3 {
            repo.save(&assessment(7, sheet)).await.unwrap();
        }
        repo.save(&assessment(8, 99)).await.unwrap();
        let (items, total) = repo.find_by_testee_id(TesteeId::new(7), PageRequest::new(1, 2)).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(items.len(), 2);
        assert!(items[0].id > items[1].id);
    }

    #[tokio::test]
    async fn test_org_filter_and_pending() {
        let repo = InMemoryAssessmentRepository::new();
        let mut a = repo.save(&assessment(1, 1)).await.unwrap();
        repo.save(&assessment(2, 2)).await.unwrap();
        a.submit();
        repo.save(&a).await.unwrap();

        let (all, _) = repo.find_by_org_id(OrgId::new(1), None, PageRequest::first()).await.unwrap();
        assert_eq!(all.len(), 2);
        let (submitted, _) = repo
            .find_by_org_id(OrgId::new(1), Some(AssessmentStatus::Submitted), PageRequest::first())
            .await
            .unwrap();
        assert_eq!(submitted.len(), 1);
        let (_, pending) = repo.find_pending_submission(PageRequest::first()).await.unwrap();
        assert_eq!(pending, 1);
    }

    #[tokio::test]
    async fn test_delete_missing() {
        let repo = InMemoryAssessmentRepository::new();
        assert!(repo.delete(AssessmentId::new(5)).await.unwrap_err().is_not_found());
    }
}
