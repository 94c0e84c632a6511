//! Medical scale aggregate.

use crate::ScaleId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a medical scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleStatus {
    /// Being edited, not visible to testees.
    #[default]
    Draft,
    /// Visible and usable.
    Published,
    /// Retired.
    Archived,
}

impl ScaleStatus {
    /// Returns the persisted value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for ScaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scoring factor (sub-scale) of a medical scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleFactor {
    pub code: String,
    pub title: String,
    /// Whether this factor is the total score.
    #[serde(default)]
    pub is_total_score: bool,
    /// Questions contributing to the factor.
    #[serde(default)]
    pub question_codes: Vec<String>,
}

/// A medical assessment scale such as PHQ-9.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalScale {
    pub id: ScaleId,
    /// Unique business code.
    pub code: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Questionnaire the scale scores.
    pub questionnaire_code: String,
    #[serde(default)]
    pub questionnaire_version: String,
    pub status: ScaleStatus,
    #[serde(default)]
    pub factors: Vec<ScaleFactor>,
    #[serde(default)]
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
}

impl MedicalScale {
    /// Creates a draft scale bound to a questionnaire.
    #[must_use]
    pub fn new(code: impl Into<String>, title: impl Into<String>, questionnaire_code: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ScaleId::default(),
            code: code.into(),
            title: title.into(),
            description: String::new(),
            category: None,
            tags: Vec::new(),
            questionnaire_code: questionnaire_code.into(),
            questionnaire_version: String::new(),
            status: ScaleStatus::Draft,
            factors: Vec::new(),
            created_by: String::new(),
            created_at: now,
            updated_by: String::new(),
            updated_at: now,
        }
    }

    /// Returns the scale with the given status.
    #[must_use]
    pub fn with_status(mut self, status: ScaleStatus) -> Self {
        self.status = status;
        self
    }

    /// Returns true when the scale is published.
    #[must_use]
    pub fn is_published(&self) -> bool {
        self.status == ScaleStatus::Published
    }
}

/// Lightweight list view of a scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleSummary {
    pub code: String,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub questionnaire_code: String,
    pub status: ScaleStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
}

impl From<&MedicalScale> for ScaleSummary {
    fn from(scale: &MedicalScale) -> Self {
        Self {
            code: scale.code.clone(),
            title: scale.title.clone(),
            description: scale.description.clone(),
            category: scale.category.clone(),
            tags: scale.tags.clone(),
            questionnaire_code: scale.questionnaire_code.clone(),
            status: scale.status,
            created_by: scale.created_by.clone(),
            created_at: scale.created_at,
            updated_by: scale.updated_by.clone(),
            updated_at: scale.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_scale_is_draft() {
        let scale = MedicalScale::new("PHQ9", "Patient Health Questionnaire", "Q-PHQ9");
        assert_eq!(scale.status, ScaleStatus::Draft);
        assert!(!scale.is_published());
        assert!(scale.with_status(ScaleStatus::Published).is_published());
    }

    #[test]
    fn test_status_serde() {
        assert_eq!(serde_json::to_string(&ScaleStatus::Published).unwrap(), "\"published\"");
        assert_eq!(ScaleStatus::Archived.to_string(), "archived");
    }

    #[test]
    fn test_summary_from_scale() {
        let mut scale = MedicalScale::new("GAD7", "Generalized Anxiety", "Q-GAD7");
        scale.category = Some("anxiety".into());
        let summary = ScaleSummary::from(&scale);
        assert_eq!(summary.code, "GAD7");
        assert_eq!(summary.category.as_deref(), Some("anxiety"));
        assert_eq!(summary.questionnaire_code, "Q-GAD7");
    }
}
