//! Testee aggregate: the person being assessed.

use crate::{OrgId, ProfileId, TesteeId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Gender of a testee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    #[default]
    Unknown,
    Male,
    Female,
}

/// Person taking assessments within an organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Testee {
    pub id: TesteeId,
    pub org_id: OrgId,
    /// Linked identity profile, when the testee has an account.
    #[serde(default)]
    pub profile_id: Option<ProfileId>,
    pub name: String,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub birthday: Option<NaiveDate>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub is_key_focus: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Testee {
    /// Creates an unsaved testee.
    #[must_use]
    pub fn new(org_id: OrgId, name: impl Into<String>, gender: Gender) -> Self {
        let now = Utc::now();
        Self {
            id: TesteeId::default(),
            org_id,
            profile_id: None,
            name: name.into(),
            gender,
            birthday: None,
            tags: Vec::new(),
            source: "unknown".to_string(),
            is_key_focus: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true when the testee carries every tag in `tags`.
    #[must_use]
    pub fn has_all_tags(&self, tags: &[String]) -> bool {
        tags.iter().all(|t| self.tags.contains(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_all_tags() {
        let mut t = Testee::new(OrgId::new(1), "Alice", Gender::Female);
        t.tags = vec!["high_risk".into(), "vip".into()];
        assert!(t.has_all_tags(&["vip".into()]));
        assert!(!t.has_all_tags(&["vip".into(), "adhd".into()]));
        assert!(t.has_all_tags(&[]));
    }
}
