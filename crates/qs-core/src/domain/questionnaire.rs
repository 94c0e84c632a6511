//! Questionnaire aggregate.

use crate::QuestionnaireId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a questionnaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionnaireStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

/// A selectable answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub code: String,
    pub content: String,
    #[serde(default)]
    pub score: f64,
}

/// A single question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub code: String,
    pub stem: String,
    #[serde(default)]
    pub options: Vec<AnswerOption>,
}

/// A versioned questionnaire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Questionnaire {
    pub id: QuestionnaireId,
    pub code: String,
    pub version: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: QuestionnaireStatus,
    /// Empty when loaded through a base (header-only) query.
    #[serde(default)]
    pub questions: Vec<Question>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Questionnaire {
    /// Creates a draft questionnaire.
    #[must_use]
    pub fn new(code: impl Into<String>, version: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: QuestionnaireId::default(),
            code: code.into(),
            version: version.into(),
            title: title.into(),
            description: String::new(),
            status: QuestionnaireStatus::Draft,
            questions: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns a copy without question bodies.
    #[must_use]
    pub fn to_base(&self) -> Self {
        Self {
            questions: Vec::new(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_base_strips_questions() {
        let mut q = Questionnaire::new("Q-PHQ9", "1.0", "PHQ-9");
        q.questions.push(Question {
            code: "q1".into(),
            stem: "Little interest".into(),
            options: vec![],
        });
        let base = q.to_base();
        assert!(base.questions.is_empty());
        assert_eq!(base.code, "Q-PHQ9");
        assert_eq!(q.questions.len(), 1);
    }
}
