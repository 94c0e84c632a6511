//! Startup cache warmup.
//!
//! Loads known hot keys through the cached repositories so the first wave of
//! traffic after a cold start does not stampede the source of truth. A failing
//! key is logged and counted, and the remaining keys are still warmed.

use crate::repository::{
    CachedAssessmentRepository, CachedPlanRepository, CachedQuestionnaireRepository, CachedScaleRepository,
    CachedTesteeRepository,
};
use crate::WarmOutcome;
use qs_config::WarmupConfig;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Hot identifiers to preload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarmupTargets {
    pub scale_codes: Vec<String>,
    pub questionnaire_codes: Vec<String>,
    pub testee_ids: Vec<u64>,
    pub plan_ids: Vec<u64>,
    pub assessment_ids: Vec<u64>,
    /// Rebuild the published scale list.
    pub published_scale_list: bool,
}

impl From<&WarmupConfig> for WarmupTargets {
    fn from(config: &WarmupConfig) -> Self {
        Self {
            scale_codes: config.scale_codes.clone(),
            questionnaire_codes: config.questionnaire_codes.clone(),
            testee_ids: config.testee_ids.clone(),
            plan_ids: config.plan_ids.clone(),
            assessment_ids: config.assessment_ids.clone(),
            published_scale_list: config.published_scale_list,
        }
    }
}

/// Per-entity warmup counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WarmupReport {
    pub entity: &'static str,
    pub loaded: usize,
    pub skipped: usize,
    pub missing: usize,
    pub failed: usize,
}

impl WarmupReport {
    /// Empty report for `entity`.
    #[must_use]
    pub fn new(entity: &'static str) -> Self {
        Self {
            entity,
            ..Self::default()
        }
    }

    /// Counts one outcome.
    pub fn record(&mut self, outcome: WarmOutcome) {
        match outcome {
            WarmOutcome::Loaded => self.loaded += 1,
            WarmOutcome::Skipped => self.skipped += 1,
            WarmOutcome::Missing => self.missing += 1,
            WarmOutcome::Failed => self.failed += 1,
        }
    }

    /// Keys attempted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.loaded + self.skipped + self.missing + self.failed
    }
}

/// Outcome of one warmup run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WarmupSummary {
    pub reports: Vec<WarmupReport>,
    pub elapsed_ms: u64,
}

impl WarmupSummary {
    /// Report of one entity, if it was warmed.
    #[must_use]
    pub fn report(&self, entity: &str) -> Option<&WarmupReport> {
        self.reports.iter().find(|r| r.entity == entity)
    }

    /// Keys that failed to load or cache.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.reports.iter().map(|r| r.failed).sum()
    }

    /// Keys loaded and cached.
    #[must_use]
    pub fn loaded(&self) -> usize {
        self.reports.iter().map(|r| r.loaded).sum()
    }
}

/// Drives warmup across the cached repositories that are registered.
#[derive(Default)]
pub struct WarmupService {
    scales: Option<Arc<CachedScaleRepository>>,
    questionnaires: Option<Arc<CachedQuestionnaireRepository>>,
    assessments: Option<Arc<CachedAssessmentRepository>>,
    testees: Option<Arc<CachedTesteeRepository>>,
    plans: Option<Arc<CachedPlanRepository>>,
}

impl WarmupService {
    /// Service with no repositories attached.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Warms scales by code.
    #[must_use]
    pub fn with_scales(mut self, repository: Arc<CachedScaleRepository>) -> Self {
        self.scales = Some(repository);
        self
    }

    /// Warms questionnaires by code.
    #[must_use]
    pub fn with_questionnaires(mut self, repository: Arc<CachedQuestionnaireRepository>) -> Self {
        self.questionnaires = Some(repository);
        self
    }

    /// Warms assessment details and status projections.
    #[must_use]
    pub fn with_assessments(mut self, repository: Arc<CachedAssessmentRepository>) -> Self {
        self.assessments = Some(repository);
        self
    }

    /// Warms testees by id.
    #[must_use]
    pub fn with_testees(mut self, repository: Arc<CachedTesteeRepository>) -> Self {
        self.testees = Some(repository);
        self
    }

    /// Warms plans by id.
    #[must_use]
    pub fn with_plans(mut self, repository: Arc<CachedPlanRepository>) -> Self {
        self.plans = Some(repository);
        self
    }

    /// Warms every target whose repository is registered.
    pub async fn warmup(&self, targets: &WarmupTargets) -> WarmupSummary {
        let started = Instant::now();
        let mut reports = Vec::new();

        if let Some(scales) = &self.scales {
            if !targets.scale_codes.is_empty() {
                reports.push(scales.warmup(&targets.scale_codes).await);
            }
            if targets.published_scale_list {
                let mut report = WarmupReport::new("scale_list");
                match scales.list_cache().rebuild().await {
                    Ok(0) => report.record(WarmOutcome::Missing),
                    Ok(_) => report.record(WarmOutcome::Loaded),
                    Err(e) => {
                        warn!(error = %e, "Failed to warm published scale list");
                        report.record(WarmOutcome::Failed);
                    }
                }
                reports.push(report);
            }
        }
        if let Some(questionnaires) = &self.questionnaires {
            if !targets.questionnaire_codes.is_empty() {
                reports.push(questionnaires.warmup(&targets.questionnaire_codes).await);
            }
        }
        if let Some(assessments) = &self.assessments {
            if !targets.assessment_ids.is_empty() {
                reports.push(assessments.warmup(&targets.assessment_ids).await);
            }
        }
        if let Some(testees) = &self.testees {
            if !targets.testee_ids.is_empty() {
                reports.push(testees.warmup(&targets.testee_ids).await);
            }
        }
        if let Some(plans) = &self.plans {
            if !targets.plan_ids.is_empty() {
                reports.push(plans.warmup(&targets.plan_ids).await);
            }
        }

        let summary = WarmupSummary {
            reports,
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        };
        for report in &summary.reports {
            info!(
                entity = report.entity,
                loaded = report.loaded,
                skipped = report.skipped,
                missing = report.missing,
                failed = report.failed,
                "Cache warmup finished"
            );
        }
        summary
    }
}

impl std::fmt::Debug for WarmupService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WarmupService")
            .field("scales", &self.scales.is_some())
            .field("questionnaires", &self.questionnaires.is_some())
            .field("assessments", &self.assessments.is_some())
            .field("testees", &self.testees.is_some())
            .field("plans", &self.plans.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts() {
        let mut report = WarmupReport::new("scale");
        for outcome in [
            WarmOutcome::Loaded,
            WarmOutcome::Loaded,
            WarmOutcome::Skipped,
            WarmOutcome::Missing,
            WarmOutcome::Failed,
        ] {
            report.record(outcome);
        }
        assert_eq!((report.loaded, report.skipped, report.missing, report.failed), (2, 1, 1, 1));
        assert_eq!(report.total(), 5);
    }

    #[test]
    fn test_targets_from_config() {
        let config = WarmupConfig {
            enabled: true,
            scale_codes: vec!["PHQ9".to_string()],
            testee_ids: vec![1, 2],
            published_scale_list: true,
            ..WarmupConfig::default()
        };
        let targets = WarmupTargets::from(&config);
        assert_eq!(targets.scale_codes, vec!["PHQ9".to_string()]);
        assert_eq!(targets.testee_ids, vec![1, 2]);
        assert!(targets.published_scale_list);
    }

    #[tokio::test]
    async fn test_empty_service_does_nothing() {
        let summary = WarmupService::new().warmup(&WarmupTargets::default()).await;
        assert!(summary.reports.is_empty());
        assert_eq!(summary.failed(), 0);
    }
}
