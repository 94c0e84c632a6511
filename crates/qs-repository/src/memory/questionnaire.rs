use crate::QuestionnaireRepository;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use qs_core::domain::{Questionnaire, QuestionnaireStatus};
use qs_core::{QsError, QsResult, QueryConditions, QuestionnaireId};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

#[derive(Default)]
struct Store {
    /// Versions per code, oldest first.
    versions: HashMap<String, Vec<Questionnaire>>,
    /// Soft-removed codes.
    removed: HashSet<String>,
}

impl Store {
    fn latest(&self, code: &str) -> Option<&Questionnaire> {
        if self.removed.contains(code) {
            return None;
        }
        self.versions.get(code).and_then(|v| v.last())
    }

    fn version(&self, code: &str, version: &str) -> Option<&Questionnaire> {
        if self.removed.contains(code) {
            return None;
        }
        self.versions.get(code)?.iter().find(|q| q.version == version)
    }
}

/// Questionnaire repository keeping every version of every code.
#[derive(Default)]
pub struct InMemoryQuestionnaireRepository {
    store: RwLock<Store>,
    sequence: AtomicU64,
}

impl InMemoryQuestionnaireRepository {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `items`.
    #[must_use]
    pub fn with_questionnaires(items: Vec<Questionnaire>) -> Self {
        let repo = Self::new();
        {
            let mut store = repo.store.write();
            for mut q in items {
                q.id = QuestionnaireId::new(repo.sequence.fetch_add(1, Ordering::Relaxed) + 1);
                store.versions.entry(q.code.clone()).or_default().push(q);
            }
        }
        repo
    }
}

impl std::fmt::Debug for InMemoryQuestionnaireRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryQuestionnaireRepository")
            .field("codes", &self.store.read().versions.len())
            .finish()
    }
}

fn matches(q: &Questionnaire, conditions: &QueryConditions) -> bool {
    conditions.iter().all(|(field, value)| match field {
        "status" => serde_status(q.status) == value,
        "title" => q.title.contains(value),
        "code" => q.code == value,
        _ => true,
    })
}

const fn serde_status(status: QuestionnaireStatus) -> &'static str {
    match status {
        QuestionnaireStatus::Draft => "draft",
        QuestionnaireStatus::Published => "published",
        QuestionnaireStatus::Archived => "archived",
    }
}

#[async_trait]
impl QuestionnaireRepository for InMemoryQuestionnaireRepository {
    async fn create(&self, questionnaire: &Questionnaire) -> QsResult<Questionnaire> {
        let mut store = self.store.write();
        if store.version(&questionnaire.code, &questionnaire.version).is_some() {
            return Err(QsError::conflict(format!(
                "Questionnaire {}:{} already exists",
                questionnaire.code, questionnaire.version
            )));
        }
        let mut stored = questionnaire.clone();
        stored.id = QuestionnaireId::new(self.sequence.fetch_add(1, Ordering::Relaxed) + 1);
        store.removed.remove(&stored.code);
        store.versions.entry(stored.code.clone()).or_default().push(stored.clone());
        debug!("Repository: created questionnaire {}:{}", stored.code, stored.version);
        Ok(stored)
    }

    async fn find_by_code(&self, code: &str) -> QsResult<Option<Questionnaire>> {
        Ok(self.store.read().latest(code).cloned())
    }

    async fn find_by_code_version(&self, code: &str, version: &str) -> QsResult<Option<Questionnaire>> {
        Ok(self.store.read().version(code, version).cloned())
    }

    async fn find_base_by_code(&self, code: &str) -> QsResult<Option<Questionnaire>> {
        Ok(self.store.read().latest(code).map(Questionnaire::to_base))
    }

    async fn find_base_by_code_version(&self, code: &str, version: &str) -> QsResult<Option<Questionnaire>> {
        Ok(self.store.read().version(code, version).map(Questionnaire::to_base))
    }

    async fn load_questions(&self, questionnaire: &mut Questionnaire) -> QsResult<()> {
        let store = self.store.read();
        let stored = store
            .version(&questionnaire.code, &questionnaire.version)
            .ok_or_else(|| QsError::not_found("Questionnaire", &questionnaire.code))?;
        questionnaire.questions = stored.questions.clone();
        Ok(())
    }

    async fn find_base_list(
        &self,
        page: u32,
        page_size: u32,
        conditions: &QueryConditions,
    ) -> QsResult<Vec<Questionnaire>> {
        let store = self.store.read();
        let mut items: Vec<Questionnaire> = store
            .versions
            .keys()
            .filter_map(|code| store.latest(code))
            .filter(|q| matches(q, conditions))
            .map(Questionnaire::to_base)
            .collect();
        items.sort_by_key(|q| q.id);
        let offset = (page.max(1) as usize - 1) * page_size as usize;
        Ok(super::window(items, offset, page_size as usize))
    }

    async fn count_with_conditions(&self, conditions: &QueryConditions) -> QsResult<u64> {
        let store = self.store.read();
        Ok(store
            .versions
            .keys()
            .filter_map(|code| store.latest(code))
            .filter(|q| matches(q, conditions))
            .count() as u64)
    }

    async fn update(&self, questionnaire: &Questionnaire) -> QsResult<Questionnaire> {
        let mut store = self.store.write();
        if store.removed.contains(&questionnaire.code) {
            return Err(QsError::not_found("Questionnaire", &questionnaire.code));
        }
        let existing = store
            .versions
            .get_mut(&questionnaire.code)
            .and_then(|v| v.iter_mut().find(|q| q.version == questionnaire.version))
            .ok_or_else(|| QsError::not_found("Questionnaire", &questionnaire.code))?;
        let mut stored = questionnaire.clone();
        stored.id = existing.id;
        stored.updated_at = Utc::now();
        *existing = stored.clone();
        Ok(stored)
    }

    async fn remove(&self, code: &str) -> QsResult<()> {
        let mut store = self.store.write();
        if !store.versions.contains_key(code) || store.removed.contains(code) {
            return Err(QsError::not_found("Questionnaire", code));
        }
        store.removed.insert(code.to_string());
        Ok(())
    }

    async fn hard_delete(&self, code: &str) -> QsResult<()> {
        let mut store = self.store.write();
        store.removed.remove(code);
        store
            .versions
            .remove(code)
            .map(|_| ())
            .ok_or_else(|| QsError::not_found("Questionnaire", code))
    }

    async fn exists_by_code(&self, code: &str) -> QsResult<bool> {
        Ok(self.store.read().latest(code).is_some())
    }
}
