//! Cached questionnaire repository.
//!
//! The latest version of a questionnaire is cached under its code and pinned
//! versions under `code:version`. Any write to a code drops both families.

use crate::{CacheContext, CacheKeyBuilder, EntityCache, WarmupReport};
use async_trait::async_trait;
use qs_core::domain::Questionnaire;
use qs_core::{QsResult, QueryConditions};
use qs_repository::QuestionnaireRepository;
use std::sync::Arc;

/// Questionnaire repository caching latest and pinned versions by code.
pub struct CachedQuestionnaireRepository {
    inner: Arc<dyn QuestionnaireRepository>,
    entity: EntityCache<Questionnaire>,
    keys: CacheKeyBuilder,
}

impl CachedQuestionnaireRepository {
    /// Decorates `inner` with the questionnaire cache of `context`.
    #[must_use]
    pub fn new(inner: Arc<dyn QuestionnaireRepository>, context: &CacheContext) -> Self {
        Self {
            inner,
            entity: context.entity("questionnaire", context.settings().entities.questionnaire),
            keys: context.keys().clone(),
        }
    }

    /// Drops the latest-version entry and every pinned version of `code`.
    async fn invalidate_code(&self, code: &str) {
        self.entity.invalidate(&self.keys.questionnaire(code, None)).await;
        self.entity
            .invalidate_pattern(&self.keys.questionnaire_pattern(code))
            .await;
    }

    /// Preloads the latest version of each code.
    pub async fn warmup(&self, codes: &[String]) -> WarmupReport {
        let mut report = WarmupReport::new("questionnaire");
        for code in codes {
            let outcome = self
                .entity
                .warm(&self.keys.questionnaire(code, None), || self.inner.find_by_code(code))
                .await;
            report.record(outcome);
        }
        report
    }
}

#[async_trait]
impl QuestionnaireRepository for CachedQuestionnaireRepository {
    async fn create(&self, questionnaire: &Questionnaire) -> QsResult<Questionnaire> {
        let created = self.inner.create(questionnaire).await?;
        let code = created.code.as_str();
        self.entity
            .store(&self.keys.questionnaire(code, Some(&created.version)), &created)
            .await;
        // A new version changes what "latest" resolves to.
        self.entity.invalidate(&self.keys.questionnaire(code, None)).await;
        Ok(created)
    }

    async fn find_by_code(&self, code: &str) -> QsResult<Option<Questionnaire>> {
        self.entity
            .read_through(&self.keys.questionnaire(code, None), || self.inner.find_by_code(code))
            .await
    }

    async fn find_by_code_version(&self, code: &str, version: &str) -> QsResult<Option<Questionnaire>> {
        if version.is_empty() {
            return self.inner.find_by_code_version(code, version).await;
        }
        self.entity
            .read_through(&self.keys.questionnaire(code, Some(version)), || {
                self.inner.find_by_code_version(code, version)
            })
            .await
    }

    async fn find_base_by_code(&self, code: &str) -> QsResult<Option<Questionnaire>> {
        self.inner.find_base_by_code(code).await
    }

    async fn find_base_by_code_version(&self, code: &str, version: &str) -> QsResult<Option<Questionnaire>> {
        self.inner.find_base_by_code_version(code, version).await
    }

    async fn load_questions(&self, questionnaire: &mut Questionnaire) -> QsResult<()> {
        self.inner.load_questions(questionnaire).await
    }

    async fn find_base_list(
        &self,
        page: u32,
        page_size: u32,
        conditions: &QueryConditions,
    ) -> QsResult<Vec<Questionnaire>> {
        self.inner.find_base_list(page, page_size, conditions).await
    }

    async fn count_with_conditions(&self, conditions: &QueryConditions) -> QsResult<u64> {
        self.inner.count_with_conditions(conditions).await
    }

    async fn update(&self, questionnaire: &Questionnaire) -> QsResult<Questionnaire> {
        let updated = self.inner.update(questionnaire).await?;
        self.invalidate_code(&updated.code).await;
        Ok(updated)
    }

    async fn remove(&self, code: &str) -> QsResult<()> {
        self.inner.remove(code).await?;
        self.invalidate_code(code).await;
        Ok(())
    }

    async fn hard_delete(&self, code: &str) -> QsResult<()> {
        self.inner.hard_delete(code).await?;
        self.invalidate_code(code).await;
        Ok(())
    }

    async fn exists_by_code(&self, code: &str) -> QsResult<bool> {
        self.inner.exists_by_code(code).await
    }
}
