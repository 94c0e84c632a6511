use crate::ScaleRepository;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use qs_core::domain::{MedicalScale, ScaleSummary};
use qs_core::{QsError, QsResult, QueryConditions, ScaleId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Scale repository keyed by lowercased code.
#[derive(Default)]
pub struct InMemoryScaleRepository {
    scales: RwLock<HashMap<String, MedicalScale>>,
    sequence: AtomicU64,
}

impl InMemoryScaleRepository {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the repository, assigning ids where missing.
    #[must_use]
    pub fn with_scales(scales: Vec<MedicalScale>) -> Self {
        let repo = Self::new();
        {
            let mut map = repo.scales.write();
            for mut scale in scales {
                if scale.id.is_zero() {
                    scale.id = ScaleId::new(repo.next_id());
                }
                map.insert(scale.code.to_lowercase(), scale);
            }
        }
        repo
    }

    fn next_id(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed) + 1
    }
}

fn matches(scale: &MedicalScale, conditions: &QueryConditions) -> bool {
    conditions.iter().all(|(field, value)| match field {
        "status" => scale.status.as_str() == value,
        "category" => scale.category.as_deref() == Some(value),
        "title" => scale.title.contains(value),
        "questionnaire_code" => scale.questionnaire_code == value,
        _ => true,
    })
}

impl std::fmt::Debug for InMemoryScaleRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryScaleRepository")
            .field("len", &self.scales.read().len())
            .finish()
    }
}

#[async_trait]
impl ScaleRepository for InMemoryScaleRepository {
    async fn create(&self, scale: &MedicalScale) -> QsResult<MedicalScale> {
        let key = scale.code.to_lowercase();
        let mut map = self.scales.write();
        if map.contains_key(&key) {
            return Err(QsError::conflict(format!("Scale code '{}' already exists", scale.code)));
        }
        let mut stored = scale.clone();
        stored.id = ScaleId::new(self.next_id());
        map.insert(key, stored.clone());
        debug!("Repository: created scale {}", stored.code);
        Ok(stored)
    }

    async fn find_by_code(&self, code: &str) -> QsResult<Option<MedicalScale>> {
        Ok(self.scales.read().get(&code.to_lowercase()).cloned())
    }

    async fn find_by_questionnaire_code(&self, questionnaire_code: &str) -> QsResult<Option<MedicalScale>> {
        Ok(self
            .scales
            .read()
            .values()
            .find(|s| s.questionnaire_code == questionnaire_code)
            .cloned())
    }

    async fn find_summary_list(
        &self,
        page: u32,
        page_size: u32,
        conditions: &QueryConditions,
    ) -> QsResult<Vec<ScaleSummary>> {
        let mut items: Vec<MedicalScale> = self
            .scales
            .read()
            .values()
            .filter(|s| matches(s, conditions))
            .cloned()
            .collect();
        items.sort_by_key(|s| s.id);
        let offset = (page.max(1) as usize - 1) * page_size as usize;
        Ok(super::window(items, offset, page_size as usize)
            .iter()
            .map(ScaleSummary::from)
            .collect())
    }

    async fn count_with_conditions(&self, conditions: &QueryConditions) -> QsResult<u64> {
        Ok(self.scales.read().values().filter(|s| matches(s, conditions)).count() as u64)
    }

    async fn update(&self, scale: &MedicalScale) -> QsResult<MedicalScale> {
        let key = scale.code.to_lowercase();
        let mut map = self.scales.write();
        let Some(existing) = map.get_mut(&key) else {
            return Err(QsError::not_found("MedicalScale", &scale.code));
        };
        let mut stored = scale.clone();
        stored.id = existing.id;
        stored.updated_at = Utc::now();
        *existing = stored.clone();
        Ok(stored)
    }

    async fn remove(&self, code: &str) -> QsResult<()> {
        self.scales
            .write()
            .remove(&code.to_lowercase())
            .map(|_| ())
            .ok_or_else(|| QsError::not_found("MedicalScale", code))
    }

    async fn exists_by_code(&self, code: &str) -> QsResult<bool> {
        Ok(self.scales.read().contains_key(&code.to_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qs_core::domain::ScaleStatus;

    fn repo() -> InMemoryScaleRepository {
        InMemoryScaleRepository::with_scales(vec![
            MedicalScale::new("PHQ9", "PHQ-9", "Q-PHQ9").with_status(ScaleStatus::Published),
            MedicalScale::new("GAD7", "GAD-7", "Q-GAD7").with_status(ScaleStatus::Published),
            MedicalScale::new("SNAP", "SNAP-IV", "Q-SNAP"),
        ])
    }

    #[tokio::test]
    async fn test_find_by_code_is_case_insensitive() {
        let repo = repo();
        let scale = repo.find_by_code("phq9").await.unwrap().unwrap();
        assert_eq!(scale.code, "PHQ9");
        assert!(repo.find_by_code("NOPE").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_conflict() {
        let repo = repo();
        let err = repo.create(&MedicalScale::new("phq9", "dup", "Q")).await.unwrap_err();
        assert!(matches!(err, QsError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_summary_list_filters_and_pages() {
        let repo = repo();
        let published = QueryConditions::new().with("status", "published");
        assert_eq!(repo.count_with_conditions(&published).await.unwrap(), 2);
        let first = repo.find_summary_list(1, 1, &published).await.unwrap();
        let second = repo.find_summary_list(2, 1, &published).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_ne!(first[0].code, second[0].code);
        assert!(repo.find_summary_list(3, 1, &published).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_remove() {
        let repo = repo();
        let mut scale = repo.find_by_code("GAD7").await.unwrap().unwrap();
        scale.title = "Renamed".into();
        repo.update(&scale).await.unwrap();
        assert_eq!(repo.find_by_code("GAD7").await.unwrap().unwrap().title, "Renamed");

        repo.remove("gad7").await.unwrap();
        assert!(!repo.exists_by_code("GAD7").await.unwrap());
        assert!(repo.remove("gad7").await.unwrap_err().is_not_found());
    }
}
