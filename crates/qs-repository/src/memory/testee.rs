use crate::TesteeRepository;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use qs_core::domain::Testee;
use qs_core::{OrgId, ProfileId, QsError, QsResult, TesteeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Testee store backed by a map.
#[derive(Default)]
pub struct InMemoryTesteeRepository {
    testees: RwLock<HashMap<TesteeId, Testee>>,
    sequence: AtomicU64,
}

impl InMemoryTesteeRepository {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted<F>(&self, predicate: F) -> Vec<Testee>
    where
        F: Fn(&Testee) -> bool,
    {
        let mut items: Vec<Testee> = self.testees.read().values().filter(|t| predicate(t)).cloned().collect();
        items.sort_by_key(|t| t.id);
        items
    }
}

impl std::fmt::Debug for InMemoryTesteeRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryTesteeRepository")
            .field("len", &self.testees.read().len())
            .finish()
    }
}

#[async_trait]
impl TesteeRepository for InMemoryTesteeRepository {
    async fn save(&self, testee: &Testee) -> QsResult<Testee> {
        let mut stored = testee.clone();
        stored.id = TesteeId::new(self.sequence.fetch_add(1, Ordering::Relaxed) + 1);
        self.testees.write().insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, testee: &Testee) -> QsResult<Testee> {
        let mut map = self.testees.write();
        let existing = map
            .get_mut(&testee.id)
            .ok_or_else(|| QsError::not_found("Testee", testee.id))?;
        let mut stored = testee.clone();
        stored.updated_at = Utc::now();
        *existing = stored.clone();
        Ok(stored)
    }

    async fn delete(&self, id: TesteeId) -> QsResult<()> {
        self.testees
            .write()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| QsError::not_found("Testee", id))
    }

    async fn find_by_id(&self, id: TesteeId) -> QsResult<Option<Testee>> {
        Ok(self.testees.read().get(&id).cloned())
    }

    async fn find_by_profile(&self, org_id: OrgId, profile_id: ProfileId) -> QsResult<Option<Testee>> {
        Ok(self
            .testees
            .read()
            .values()
            .find(|t| t.org_id == org_id && t.profile_id == Some(profile_id))
            .cloned())
    }

    async fn find_by_org_and_name(&self, org_id: OrgId, name: &str) -> QsResult<Vec<Testee>> {
        Ok(self.sorted(|t| t.org_id == org_id && t.name.contains(name)))
    }

    async fn list_by_org(&self, org_id: OrgId, offset: usize, limit: usize) -> QsResult<Vec<Testee>> {
        Ok(super::window(self.sorted(|t| t.org_id == org_id), offset, limit))
    }

    async fn list_by_tags(&self, org_id: OrgId, tags: &[String], offset: usize, limit: usize) -> QsResult<Vec<Testee>> {
        Ok(super::window(
            self.sorted(|t| t.org_id == org_id && t.has_all_tags(tags)),
            offset,
            limit,
        ))
    }

    async fn list_key_focus(&self, org_id: OrgId, offset: usize, limit: usize) -> QsResult<Vec<Testee>> {
        Ok(super::window(
            self.sorted(|t| t.org_id == org_id && t.is_key_focus),
            offset,
            limit,
        ))
    }

    async fn list_by_profile_ids(&self, profile_ids: &[ProfileId], offset: usize, limit: usize) -> QsResult<Vec<Testee>> {
        Ok(super::window(
            self.sorted(|t| t.profile_id.is_some_and(|p| profile_ids.contains(&p))),
            offset,
            limit,
        ))
    }

    async fn count(&self, org_id: OrgId) -> QsResult<u64> {
        Ok(self.testees.read().values().filter(|t| t.org_id == org_id).count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qs_core::domain::Gender;

    #[tokio::test]
    async fn test_crud() {
        let repo = InMemoryTesteeRepository::new();
        let mut saved = repo.save(&Testee::new(OrgId::new(1), "Alice", Gender::Female)).await.unwrap();
        saved.is_key_focus = true;
        repo.update(&saved).await.unwrap();
        assert!(repo.find_by_id(saved.id).await.unwrap().unwrap().is_key_focus);
        assert_eq!(repo.list_key_focus(OrgId::new(1), 0, 10).await.unwrap().len(), 1);
        repo.delete(saved.id).await.unwrap();
        assert!(repo.find_by_id(saved.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_profile_lookups() {
        let repo = InMemoryTesteeRepository::new();
        let mut t = Testee::new(OrgId::new(1), "Bob", Gender::Male);
        t.profile_id = Some(ProfileId::new(42));
        repo.save(&t).await.unwrap();
        repo.save(&Testee::new(OrgId::new(1), "Carol", Gender::Female)).await.unwrap();

        assert!(repo.find_by_profile(OrgId::new(1), ProfileId::new(42)).await.unwrap().is_some());
        let by_profiles = repo.list_by_profile_ids(&[ProfileId::new(42)], 0, 10).await.unwrap();
        assert_eq!(by_profiles.len(), 1);
        assert_eq!(repo.count(OrgId::new(1)).await.unwrap(), 2);
        assert_eq!(repo.list_by_org(OrgId::new(1), 1, 10).await.unwrap().len(), 1);
    }
}
