//! Assessment aggregate.

use crate::{AnswerSheetId, AssessmentId, OrgId, PlanId, ScreeningProjectId, TesteeId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Processing status of an assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentStatus {
    /// Created, answers not yet submitted.
    #[default]
    Pending,
    /// Answers submitted, waiting for interpretation.
    Submitted,
    /// Scored and interpreted.
    Interpreted,
    /// Interpretation failed.
    Failed,
}

impl AssessmentStatus {
    /// Returns the persisted value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Submitted => "submitted",
            Self::Interpreted => "interpreted",
            Self::Failed => "failed",
        }
    }

    /// Returns true when no further transition is expected.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Interpreted | Self::Failed)
    }
}

impl fmt::Display for AssessmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk level produced by interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    None,
    Low,
    Medium,
    High,
    Severe,
}

impl RiskLevel {
    /// Returns the persisted value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Severe => "severe",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One assessment of a testee against a questionnaire, optionally scored by a scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub id: AssessmentId,
    pub org_id: OrgId,
    pub testee_id: TesteeId,
    pub questionnaire_code: String,
    #[serde(default)]
    pub questionnaire_version: String,
    pub answer_sheet_id: AnswerSheetId,
    #[serde(default)]
    pub scale_code: Option<String>,
    #[serde(default)]
    pub plan_id: Option<PlanId>,
    #[serde(default)]
    pub screening_project_id: Option<ScreeningProjectId>,
    pub status: AssessmentStatus,
    #[serde(default)]
    pub total_score: Option<f64>,
    #[serde(default)]
    pub risk_level: Option<RiskLevel>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub interpreted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub failed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Assessment {
    /// Creates a pending assessment.
    #[must_use]
    pub fn new(
        org_id: OrgId,
        testee_id: TesteeId,
        questionnaire_code: impl Into<String>,
        answer_sheet_id: AnswerSheetId,
    ) -> Self {
        Self {
            id: AssessmentId::default(),
            org_id,
            testee_id,
            questionnaire_code: questionnaire_code.into(),
            questionnaire_version: String::new(),
            answer_sheet_id,
            scale_code: None,
            plan_id: None,
            screening_project_id: None,
            status: AssessmentStatus::Pending,
            total_score: None,
            risk_level: None,
            submitted_at: None,
            interpreted_at: None,
            failed_at: None,
            created_at: Utc::now(),
        }
    }

    /// Marks the answers as submitted.
    pub fn submit(&mut self) {
        self.status = AssessmentStatus::Submitted;
        self.submitted_at = Some(Utc::now());
    }

    /// Records the interpretation outcome.
    pub fn interpret(&mut self, total_score: f64, risk_level: RiskLevel) {
        self.status = AssessmentStatus::Interpreted;
        self.total_score = Some(total_score);
        self.risk_level = Some(risk_level);
        self.interpreted_at = Some(Utc::now());
    }

    /// Records an interpretation failure.
    pub fn fail(&mut self) {
        self.status = AssessmentStatus::Failed;
        self.failed_at = Some(Utc::now());
    }
}
