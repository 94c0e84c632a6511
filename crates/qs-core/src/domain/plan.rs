//! Assessment plan aggregate: a periodic assessment template.

use crate::{OrgId, PlanId, TesteeId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of an assessment plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    #[default]
    Active,
    Paused,
    Finished,
    Canceled,
}

impl PlanStatus {
    /// Returns the persisted value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Finished => "finished",
            Self::Canceled => "canceled",
        }
    }
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How plan occurrences are spaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleType {
    #[default]
    ByWeek,
    ByDay,
    FixedDate,
    Custom,
}

/// Recurring assessment schedule for one scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentPlan {
    pub id: PlanId,
    pub org_id: OrgId,
    pub scale_code: String,
    pub schedule_type: ScheduleType,
    /// Every N weeks or days.
    #[serde(default)]
    pub interval: u32,
    pub total_times: u32,
    pub status: PlanStatus,
    /// Testees enrolled in the plan.
    #[serde(default)]
    pub testee_ids: Vec<TesteeId>,
    pub created_at: DateTime<Utc>,
}

impl AssessmentPlan {
    /// Creates an active plan.
    #[must_use]
    pub fn new(org_id: OrgId, scale_code: impl Into<String>, schedule_type: ScheduleType, interval: u32, total_times: u32) -> Self {
        Self {
            id: PlanId::default(),
            org_id,
            scale_code: scale_code.into(),
            schedule_type,
            interval,
            total_times,
            status: PlanStatus::Active,
            testee_ids: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Returns true while the plan schedules assessments.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == PlanStatus::Active
    }
}
