//! Shared fixtures: call-counting repositories over the in-memory stores.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use qs_cache::{Cache, CacheContext, CacheSettings, MemoryCache};
use qs_core::domain::{
    Assessment, AssessmentPlan, AssessmentStatus, MedicalScale, Questionnaire, ScaleStatus, ScaleSummary, Testee,
};
use qs_core::{
    AnswerSheetId, AssessmentId, OrgId, PageRequest, PlanId, ProfileId, QsResult, QueryConditions,
    ScreeningProjectId, TesteeId,
};
use qs_repository::{
    AssessmentRepository, InMemoryAssessmentRepository, InMemoryPlanRepository, InMemoryQuestionnaireRepository,
    InMemoryScaleRepository, InMemoryTesteeRepository, PlanRepository, QuestionnaireRepository, ScaleRepository,
    TesteeRepository,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Counts calls per method name.
#[derive(Debug, Default)]
pub struct CallLog {
    counts: Mutex<HashMap<&'static str, usize>>,
}

impl CallLog {
    pub fn hit(&self, method: &'static str) {
        *self.counts.lock().entry(method).or_default() += 1;
    }

    pub fn count(&self, method: &str) -> usize {
        self.counts.lock().get(method).copied().unwrap_or_default()
    }
}

pub struct Harness {
    pub memory: Arc<MemoryCache>,
    pub context: CacheContext,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(CacheSettings::default())
    }

    pub fn with_settings(settings: CacheSettings) -> Self {
        let memory = Arc::new(MemoryCache::new());
        let cache: Arc<dyn Cache> = memory.clone();
        Self {
            context: CacheContext::new(cache, settings),
            memory,
        }
    }

    /// Waits for background populates and sweeps.
    pub async fn settle(&self) {
        self.context.writer().wait_idle().await;
    }
}

pub fn published_scale(code: &str) -> MedicalScale {
    MedicalScale::new(code, format!("{code} scale"), format!("Q-{code}")).with_status(ScaleStatus::Published)
}

// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct CountingScaleRepository {
    pub inner: InMemoryScaleRepository,
    pub calls: CallLog,
    pub load_delay: Option<Duration>,
}

impl CountingScaleRepository {
    pub fn with_scales(scales: Vec<MedicalScale>) -> Self {
        Self {
            inner: InMemoryScaleRepository::with_scales(scales),
            ..Self::default()
        }
    }
}

#[async_trait]
impl ScaleRepository for CountingScaleRepository {
    async fn create(&self, scale: &MedicalScale) -> QsResult<MedicalScale> {
        self.calls.hit("create");
        self.inner.create(scale).await
    }

    async fn find_by_code(&self, code: &str) -> QsResult<Option<MedicalScale>> {
        self.calls.hit("find_by_code");
        if let Some(delay) = self.load_delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.find_by_code(code).await
    }

    async fn find_by_questionnaire_code(&self, questionnaire_code: &str) -> QsResult<Option<MedicalScale>> {
        self.calls.hit("find_by_questionnaire_code");
        self.inner.find_by_questionnaire_code(questionnaire_code).await
    }

    async fn find_summary_list(
        &self,
        page: u32,
        page_size: u32,
        conditions: &QueryConditions,
    ) -> QsResult<Vec<ScaleSummary>> {
        self.calls.hit("find_summary_list");
        self.inner.find_summary_list(page, page_size, conditions).await
    }

    async fn count_with_conditions(&self, conditions: &QueryConditions) -> QsResult<u64> {
        self.calls.hit("count_with_conditions");
        self.inner.count_with_conditions(conditions).await
    }

    async fn update(&self, scale: &MedicalScale) -> QsResult<MedicalScale> {
        self.calls.hit("update");
        self.inner.update(scale).await
    }

    async fn remove(&self, code: &str) -> QsResult<()> {
        self.calls.hit("remove");
        self.inner.remove(code).await
    }

    async fn exists_by_code(&self, code: &str) -> QsResult<bool> {
        self.calls.hit("exists_by_code");
        self.inner.exists_by_code(code).await
    }
}

// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct CountingQuestionnaireRepository {
    pub inner: InMemoryQuestionnaireRepository,
    pub calls: CallLog,
}

#[async_trait]
impl QuestionnaireRepository for CountingQuestionnaireRepository {
    async fn create(&self, questionnaire: &Questionnaire) -> QsResult<Questionnaire> {
        self.calls.hit("create");
        self.inner.create(questionnaire).await
    }

    async fn find_by_code(&self, code: &str) -> QsResult<Option<Questionnaire>> {
        self.calls.hit("find_by_code");
        self.inner.find_by_code(code).await
    }

    async fn find_by_code_version(&self, code: &str, version: &str) -> QsResult<Option<Questionnaire>> {
        self.calls.hit("find_by_code_version");
        self.inner.find_by_code_version(code, version).await
    }

    async fn find_base_by_code(&self, code: &str) -> QsResult<Option<Questionnaire>> {
        self.calls.hit("find_base_by_code");
        self.inner.find_base_by_code(code).await
    }

    async fn find_base_by_code_version(&self, code: &str, version: &str) -> QsResult<Option<Questionnaire>> {
        self.calls.hit("find_base_by_code_version");
        self.inner.find_base_by_code_version(code, version).await
    }

    async fn load_questions(&self, questionnaire: &mut Questionnaire) -> QsResult<()> {
        self.calls.hit("load_questions");
        self.inner.load_questions(questionnaire).await
    }

    async fn find_base_list(
        &self,
        page: u32,
        page_size: u32,
        conditions: &QueryConditions,
    ) -> QsResult<Vec<Questionnaire>> {
        self.calls.hit("find_base_list");
        self.inner.find_base_list(page, page_size, conditions).await
    }

    async fn count_with_conditions(&self, conditions: &QueryConditions) -> QsResult<u64> {
        self.calls.hit("count_with_conditions");
        self.inner.count_with_conditions(conditions).await
    }

    async fn update(&self, questionnaire: &Questionnaire) -> QsResult<Questionnaire> {
        self.calls.hit("update");
        self.inner.update(questionnaire).await
    }

    async fn remove(&self, code: &str) -> QsResult<()> {
        self.calls.hit("remove");
        self.inner.remove(code).await
    }

    async fn hard_delete(&self, code: &str) -> QsResult<()> {
        self.calls.hit("hard_delete");
        self.inner.hard_delete(code).await
    }

    async fn exists_by_code(&self, code: &str) -> QsResult<bool> {
        self.calls.hit("exists_by_code");
        self.inner.exists_by_code(code).await
    }
}

// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct CountingAssessmentRepository {
    pub inner: InMemoryAssessmentRepository,
    pub calls: CallLog,
}

#[async_trait]
impl AssessmentRepository for CountingAssessmentRepository {
    async fn save(&self, assessment: &Assessment) -> QsResult<Assessment> {
        self.calls.hit("save");
        self.inner.save(assessment).await
    }

    async fn find_by_id(&self, id: AssessmentId) -> QsResult<Option<Assessment>> {
        self.calls.hit("find_by_id");
        self.inner.find_by_id(id).await
    }

    async fn delete(&self, id: AssessmentId) -> QsResult<()> {
        self.calls.hit("delete");
        self.inner.delete(id).await
    }

    async fn find_by_answer_sheet_id(&self, answer_sheet_id: AnswerSheetId) -> QsResult<Option<Assessment>> {
        self.calls.hit("find_by_answer_sheet_id");
        self.inner.find_by_answer_sheet_id(answer_sheet_id).await
    }

    async fn find_by_testee_id(&self, testee_id: TesteeId, page: PageRequest) -> QsResult<(Vec<Assessment>, u64)> {
        self.calls.hit("find_by_testee_id");
        self.inner.find_by_testee_id(testee_id, page).await
    }

    async fn find_by_testee_and_scale(
        &self,
        testee_id: TesteeId,
        scale_code: &str,
        page: PageRequest,
    ) -> QsResult<(Vec<Assessment>, u64)> {
        self.calls.hit("find_by_testee_and_scale");
        self.inner.find_by_testee_and_scale(testee_id, scale_code, page).await
    }

    async fn find_by_plan_id(&self, plan_id: PlanId, page: PageRequest) -> QsResult<(Vec<Assessment>, u64)> {
        self.calls.hit("find_by_plan_id");
        self.inner.find_by_plan_id(plan_id, page).await
    }

    async fn find_by_screening_project_id(
        &self,
        project_id: ScreeningProjectId,
        page: PageRequest,
    ) -> QsResult<(Vec<Assessment>, u64)> {
        self.calls.hit("find_by_screening_project_id");
        self.inner.find_by_screening_project_id(project_id, page).await
    }

    async fn count_by_status(&self, status: AssessmentStatus) -> QsResult<u64> {
        self.calls.hit("count_by_status");
        self.inner.count_by_status(status).await
    }

    async fn count_by_testee_and_status(&self, testee_id: TesteeId, status: AssessmentStatus) -> QsResult<u64> {
        self.calls.hit("count_by_testee_and_status");
        self.inner.count_by_testee_and_status(testee_id, status).await
    }

    async fn count_by_org_and_status(&self, org_id: OrgId, status: AssessmentStatus) -> QsResult<u64> {
        self.calls.hit("count_by_org_and_status");
        self.inner.count_by_org_and_status(org_id, status).await
    }

    async fn find_by_ids(&self, ids: &[AssessmentId]) -> QsResult<Vec<Assessment>> {
        self.calls.hit("find_by_ids");
        self.inner.find_by_ids(ids).await
    }

    async fn find_by_org_id(
        &self,
        org_id: OrgId,
        status: Option<AssessmentStatus>,
        page: PageRequest,
    ) -> QsResult<(Vec<Assessment>, u64)> {
        self.calls.hit("find_by_org_id");
        self.inner.find_by_org_id(org_id, status, page).await
    }

    async fn find_pending_submission(&self, page: PageRequest) -> QsResult<(Vec<Assessment>, u64)> {
        self.calls.hit("find_pending_submission");
        self.inner.find_pending_submission(page).await
    }
}

// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct CountingTesteeRepository {
    pub inner: InMemoryTesteeRepository,
    pub calls: CallLog,
}

#[async_trait]
impl TesteeRepository for CountingTesteeRepository {
    async fn save(&self, testee: &Testee) -> QsResult<Testee> {
        self.calls.hit("save");
        self.inner.save(testee).await
    }

    async fn update(&self, testee: &Testee) -> QsResult<Testee> {
        self.calls.hit("update");
        self.inner.update(testee).await
    }

    async fn delete(&self, id: TesteeId) -> QsResult<()> {
        self.calls.hit("delete");
        self.inner.delete(id).await
    }

    async fn find_by_id(&self, id: TesteeId) -> QsResult<Option<Testee>> {
        self.calls.hit("find_by_id");
        self.inner.find_by_id(id).await
    }

    async fn find_by_profile(&self, org_id: OrgId, profile_id: ProfileId) -> QsResult<Option<Testee>> {
        self.calls.hit("find_by_profile");
        self.inner.find_by_profile(org_id, profile_id).await
    }

    async fn find_by_org_and_name(&self, org_id: OrgId, name: &str) -> QsResult<Vec<Testee>> {
        self.calls.hit("find_by_org_and_name");
        self.inner.find_by_org_and_name(org_id, name).await
    }

    async fn list_by_org(&self, org_id: OrgId, offset: usize, limit: usize) -> QsResult<Vec<Testee>> {
        self.calls.hit("list_by_org");
        self.inner.list_by_org(org_id, offset, limit).await
    }

    async fn list_by_tags(&self, org_id: OrgId, tags: &[String], offset: usize, limit: usize) -> QsResult<Vec<Testee>> {
        self.calls.hit("list_by_tags");
        self.inner.list_by_tags(org_id, tags, offset, limit).await
    }

    async fn list_key_focus(&self, org_id: OrgId, offset: usize, limit: usize) -> QsResult<Vec<Testee>> {
        self.calls.hit("list_key_focus");
        self.inner.list_key_focus(org_id, offset, limit).await
    }

    async fn list_by_profile_ids(&self, profile_ids: &[ProfileId], offset: usize, limit: usize) -> QsResult<Vec<Testee>> {
        self.calls.hit("list_by_profile_ids");
        self.inner.list_by_profile_ids(profile_ids, offset, limit).await
    }

    async fn count(&self, org_id: OrgId) -> QsResult<u64> {
        self.calls.hit("count");
        self.inner.count(org_id).await
    }
}

// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct CountingPlanRepository {
    pub inner: InMemoryPlanRepository,
    pub calls: CallLog,
}

#[async_trait]
impl PlanRepository for CountingPlanRepository {
    async fn save(&self, plan: &AssessmentPlan) -> QsResult<AssessmentPlan> {
        self.calls.hit("save");
        self.inner.save(plan).await
    }

    async fn find_by_id(&self, id: PlanId) -> QsResult<Option<AssessmentPlan>> {
        self.calls.hit("find_by_id");
        self.inner.find_by_id(id).await
    }

    async fn find_by_scale_code(&self, scale_code: &str) -> QsResult<Vec<AssessmentPlan>> {
        self.calls.hit("find_by_scale_code");
        self.inner.find_by_scale_code(scale_code).await
    }

    async fn find_active_plans(&self) -> QsResult<Vec<AssessmentPlan>> {
        self.calls.hit("find_active_plans");
        self.inner.find_active_plans().await
    }

    async fn find_by_testee_id(&self, testee_id: TesteeId) -> QsResult<Vec<AssessmentPlan>> {
        self.calls.hit("find_by_testee_id");
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
        self.calls.hit("find_list");
        self.inner.find_list(org_id, scale_code, status, page, page_size).await
    }
}
