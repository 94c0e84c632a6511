use crate::PlanRepository;
use async_trait::async_trait;
use parking_lot::RwLock;
use qs_core::domain::AssessmentPlan;
use qs_core::{OrgId, PageRequest, PlanId, QsResult, TesteeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Plan store backed by a map.
#[derive(Default)]
pub struct InMemoryPlanRepository {
    plans: RwLock<HashMap<PlanId, AssessmentPlan>>,
    sequence: AtomicU64,
}

impl InMemoryPlanRepository {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted<F>(&self, predicate: F) -> Vec<AssessmentPlan>
    where
        F: Fn(&AssessmentPlan) -> bool,
    {
        let mut items: Vec<AssessmentPlan> = self.plans.read().values().filter(|p| predicate(p)).cloned().collect();
        items.sort_by_key(|p| p.id);
        items
    }
}

impl std::fmt::Debug for InMemoryPlanRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryPlanRepository")
            .field("len", &self.plans.read().len())
            .finish()
    }
}

#[async_trait]
impl PlanRepository for InMemoryPlanRepository {
    async fn save(&self, plan: &AssessmentPlan) -> QsResult<AssessmentPlan> {
        let mut stored = plan.clone();
        if stored.id.is_zero() {
            stored.id = PlanId::new(self.sequence.fetch_add(1, Ordering::Relaxed) + 1);
        }
        self.plans.write().insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: PlanId) -> QsResult<Option<AssessmentPlan>> {
        Ok(self.plans.read().get(&id).cloned())
    }

    async fn find_by_scale_code(&self, scale_code: &str) -> QsResult<Vec<AssessmentPlan>> {
        Ok(self.sorted(|p| p.scale_code == scale_code))
    }

    async fn find_active_plans(&self) -> QsResult<Vec<AssessmentPlan>> {
        Ok(self.sorted(AssessmentPlan::is_active))
    }

    async fn find_by_testee_id(&self, testee_id: TesteeId) -> QsResult<Vec<AssessmentPlan>> {
        Ok(self.sorted(|p| p.testee_ids.contains(&testee_id)))
    }

    async fn find_list(
        &self,
        org_id: OrgId,
        scale_code: &str,
        status: &str,
        page: u32,
        page_size: u32,
    ) -> QsResult<(Vec<AssessmentPlan>, u64)> {
        let items = self.sorted(|p| {
            p.org_id == org_id
                && (scale_code.is_empty() || p.scale_code == scale_code)
                && (status.is_empty() || p.status.as_str() == status)
        });
        Ok(super::paginate(items, PageRequest::new(page, page_size)))
    }
}
