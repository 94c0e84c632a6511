//! Repository trait definitions.
//!
//! Lookups by identifier return `Ok(None)` when the aggregate does not exist;
//! errors are reserved for failures of the underlying store.

use async_trait::async_trait;
use qs_core::domain::{
    Assessment, AssessmentPlan, AssessmentStatus, MedicalScale, Questionnaire, ScaleSummary, Testee,
};
use qs_core::{
    AnswerSheetId, AssessmentId, Interface, OrgId, PageRequest, PlanId, ProfileId, QsResult, QueryConditions,
    ScreeningProjectId, TesteeId,
};

/// Medical scale repository.
#[async_trait]
pub trait ScaleRepository: Interface + Send + Sync {
    /// Persists a new scale and returns it with its id assigned.
    async fn create(&self, scale: &MedicalScale) -> QsResult<MedicalScale>;

    /// Finds a scale by its business code (case-insensitive).
    async fn find_by_code(&self, code: &str) -> QsResult<Option<MedicalScale>>;

    /// Finds the scale scoring a questionnaire.
    async fn find_by_questionnaire_code(&self, questionnaire_code: &str) -> QsResult<Option<MedicalScale>>;

    /// Lists scale summaries matching `conditions`, 1-based page.
    async fn find_summary_list(
        &self,
        page: u32,
        page_size: u32,
        conditions: &QueryConditions,
    ) -> QsResult<Vec<ScaleSummary>>;

    /// Counts scales matching `conditions`.
    async fn count_with_conditions(&self, conditions: &QueryConditions) -> QsResult<u64>;

    /// Updates an existing scale.
    async fn update(&self, scale: &MedicalScale) -> QsResult<MedicalScale>;

    /// Removes a scale by code.
    async fn remove(&self, code: &str) -> QsResult<()>;

    /// Checks if a code is taken.
    async fn exists_by_code(&self, code: &str) -> QsResult<bool>;
}

/// Questionnaire repository.
#[async_trait]
pub trait QuestionnaireRepository: Interface + Send + Sync {
    /// Persists a new questionnaire version.
    async fn create(&self, questionnaire: &Questionnaire) -> QsResult<Questionnaire>;

    /// Finds the latest version of a questionnaire, with questions.
    async fn find_by_code(&self, code: &str) -> QsResult<Option<Questionnaire>>;

    /// Finds a specific version, with questions.
    async fn find_by_code_version(&self, code: &str, version: &str) -> QsResult<Option<Questionnaire>>;

    /// Finds the latest version without questions.
    async fn find_base_by_code(&self, code: &str) -> QsResult<Option<Questionnaire>>;

    /// Finds a specific version without questions.
    async fn find_base_by_code_version(&self, code: &str, version: &str) -> QsResult<Option<Questionnaire>>;

    /// Fills in the questions of a base questionnaire.
    async fn load_questions(&self, questionnaire: &mut Questionnaire) -> QsResult<()>;

    /// Lists questionnaire headers matching `conditions`, 1-based page.
    async fn find_base_list(
        &self,
        page: u32,
        page_size: u32,
        conditions: &QueryConditions,
    ) -> QsResult<Vec<Questionnaire>>;

    /// Counts questionnaires matching `conditions`.
    async fn count_with_conditions(&self, conditions: &QueryConditions) -> QsResult<u64>;

    /// Updates a questionnaire version.
    async fn update(&self, questionnaire: &Questionnaire) -> QsResult<Questionnaire>;

    /// Soft-removes every version of a questionnaire.
    async fn remove(&self, code: &str) -> QsResult<()>;

    /// Permanently deletes every version of a questionnaire.
    async fn hard_delete(&self, code: &str) -> QsResult<()>;

    /// Checks if a code is taken.
    async fn exists_by_code(&self, code: &str) -> QsResult<bool>;
}

/// Assessment repository.
#[async_trait]
pub trait AssessmentRepository: Interface + Send + Sync {
    /// Inserts or updates an assessment, returning the stored value.
    async fn save(&self, assessment: &Assessment) -> QsResult<Assessment>;

    /// Finds an assessment by ID.
    async fn find_by_id(&self, id: AssessmentId) -> QsResult<Option<Assessment>>;

    /// Deletes an assessment by ID.
    async fn delete(&self, id: AssessmentId) -> QsResult<()>;

    /// Finds the assessment created from an answer sheet.
    async fn find_by_answer_sheet_id(&self, answer_sheet_id: AnswerSheetId) -> QsResult<Option<Assessment>>;

    /// Lists a testee's assessments, newest first, with the total count.
    async fn find_by_testee_id(&self, testee_id: TesteeId, page: PageRequest) -> QsResult<(Vec<Assessment>, u64)>;

    /// Lists a testee's assessments of one scale.
    async fn find_by_testee_and_scale(
        &self,
        testee_id: TesteeId,
        scale_code: &str,
        page: PageRequest,
    ) -> QsResult<(Vec<Assessment>, u64)>;

    /// Lists assessments generated by a plan.
    async fn find_by_plan_id(&self, plan_id: PlanId, page: PageRequest) -> QsResult<(Vec<Assessment>, u64)>;

    /// Lists assessments of a screening project.
    async fn find_by_screening_project_id(
        &self,
        project_id: ScreeningProjectId,
        page: PageRequest,
    ) -> QsResult<(Vec<Assessment>, u64)>;

    /// Counts assessments in a status.
    async fn count_by_status(&self, status: AssessmentStatus) -> QsResult<u64>;

    /// Counts a testee's assessments in a status.
    async fn count_by_testee_and_status(&self, testee_id: TesteeId, status: AssessmentStatus) -> QsResult<u64>;

    /// Counts an organization's assessments in a status.
    async fn count_by_org_and_status(&self, org_id: OrgId, status: AssessmentStatus) -> QsResult<u64>;

    /// Finds several assessments by ID. Missing IDs are skipped.
    async fn find_by_ids(&self, ids: &[AssessmentId]) -> QsResult<Vec<Assessment>>;

    /// Lists an organization's assessments, optionally filtered by status.
    async fn find_by_org_id(
        &self,
        org_id: OrgId,
        status: Option<AssessmentStatus>,
        page: PageRequest,
    ) -> QsResult<(Vec<Assessment>, u64)>;

    /// Lists assessments still waiting for answers.
    async fn find_pending_submission(&self, page: PageRequest) -> QsResult<(Vec<Assessment>, u64)>;
}

/// Testee repository.
#[async_trait]
pub trait TesteeRepository: Interface + Send + Sync {
    /// Persists a new testee and returns it with its id assigned.
    async fn save(&self, testee: &Testee) -> QsResult<Testee>;

    /// Updates an existing testee.
    async fn update(&self, testee: &Testee) -> QsResult<Testee>;

    /// Deletes a testee by ID.
    async fn delete(&self, id: TesteeId) -> QsResult<()>;

    /// Finds a testee by ID.
    async fn find_by_id(&self, id: TesteeId) -> QsResult<Option<Testee>>;

    /// Finds the testee linked to a profile within an organization.
    async fn find_by_profile(&self, org_id: OrgId, profile_id: ProfileId) -> QsResult<Option<Testee>>;

    /// Finds testees by name within an organization.
    async fn find_by_org_and_name(&self, org_id: OrgId, name: &str) -> QsResult<Vec<Testee>>;

    /// Lists an organization's testees.
    async fn list_by_org(&self, org_id: OrgId, offset: usize, limit: usize) -> QsResult<Vec<Testee>>;

    /// Lists testees carrying every tag in `tags`.
    async fn list_by_tags(&self, org_id: OrgId, tags: &[String], offset: usize, limit: usize) -> QsResult<Vec<Testee>>;

    /// Lists testees flagged for key focus.
    async fn list_key_focus(&self, org_id: OrgId, offset: usize, limit: usize) -> QsResult<Vec<Testee>>;

    /// Lists testees linked to any of `profile_ids`.
    async fn list_by_profile_ids(&self, profile_ids: &[ProfileId], offset: usize, limit: usize) -> QsResult<Vec<Testee>>;

    /// Counts an organization's testees.
    async fn count(&self, org_id: OrgId) -> QsResult<u64>;
}

/// Assessment plan repository.
#[async_trait]
pub trait PlanRepository: Interface + Send + Sync {
    /// Inserts or updates a plan, returning the stored value.
    async fn save(&self, plan: &AssessmentPlan) -> QsResult<AssessmentPlan>;

    /// Finds a plan by ID.
    async fn find_by_id(&self, id: PlanId) -> QsResult<Option<AssessmentPlan>>;

    /// Lists plans of a scale.
    async fn find_by_scale_code(&self, scale_code: &str) -> QsResult<Vec<AssessmentPlan>>;

    /// Lists every active plan.
    async fn find_active_plans(&self) -> QsResult<Vec<AssessmentPlan>>;

    /// Lists plans a testee is enrolled in.
    async fn find_by_testee_id(&self, testee_id: TesteeId) -> QsResult<Vec<AssessmentPlan>>;

    /// Filtered list; empty `scale_code` or `status` means no filter.
    async fn find_list(
        &self,
        org_id: OrgId,
        scale_code: &str,
        status: &str,
        page: u32,
        page_size: u32,
    ) -> QsResult<(Vec<AssessmentPlan>, u64)>;
}
