//! Write-through projection of an assessment's current status.
//!
//! Serves frequent status polling without loading the full assessment. Every
//! successful assessment write overwrites the projection.

use crate::{CacheContext, CacheKeyBuilder, EntityCache, WarmOutcome};
use chrono::{DateTime, Utc};
use qs_core::domain::{Assessment, AssessmentStatus, RiskLevel};
use qs_core::{AssessmentId, QsResult};
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Status view of one assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentStatusView {
    pub id: AssessmentId,
    pub status: AssessmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpreted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
}

impl From<&Assessment> for AssessmentStatusView {
    fn from(assessment: &Assessment) -> Self {
        Self {
            id: assessment.id,
            status: assessment.status,
            submitted_at: assessment.submitted_at,
            interpreted_at: assessment.interpreted_at,
            failed_at: assessment.failed_at,
            total_score: assessment.total_score,
            risk_level: assessment.risk_level,
        }
    }
}

/// Cache of assessment status projections.
pub struct AssessmentStatusCache {
    entity: EntityCache<AssessmentStatusView>,
    keys: CacheKeyBuilder,
}

impl AssessmentStatusCache {
    /// Creates the projection cache over `context`.
    #[must_use]
    pub fn new(context: &CacheContext) -> Self {
        Self {
            entity: context.entity("assessment_status", context.settings().entities.assessment_status),
            keys: context.keys().clone(),
        }
    }

    /// Returns the projection, loading the assessment on a miss.
    pub async fn get<F, Fut>(&self, id: AssessmentId, load: F) -> QsResult<Option<AssessmentStatusView>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = QsResult<Option<Assessment>>>,
    {
        self.entity
            .read_through(&self.keys.assessment_status(id), || async move {
                load()
                    .await
                    .map(|found| found.as_ref().map(AssessmentStatusView::from))
            })
            .await
    }

    /// Mirrors a freshly written assessment.
    pub async fn update(&self, assessment: &Assessment) {
        let view = AssessmentStatusView::from(assessment);
        self.entity
            .on_write(&self.keys.assessment_status(assessment.id), &view)
            .await;
    }

    /// Drops the projection of a deleted assessment.
    pub async fn delete(&self, id: AssessmentId) {
        self.entity.invalidate(&self.keys.assessment_status(id)).await;
    }

    /// Loads and caches the projection unless present.
    pub(crate) async fn warm<F, Fut>(&self, id: AssessmentId, load: F) -> WarmOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = QsResult<Option<Assessment>>>,
    {
        self.entity
            .warm(&self.keys.assessment_status(id), || async move {
                load()
                    .await
                    .map(|found| found.as_ref().map(AssessmentStatusView::from))
            })
            .await
    }
}
