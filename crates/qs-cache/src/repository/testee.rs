//! Cached testee repository.

use crate::{CacheContext, CacheKeyBuilder, EntityCache, WarmupReport};
use async_trait::async_trait;
use qs_core::domain::Testee;
use qs_core::{OrgId, ProfileId, QsResult, TesteeId};
use qs_repository::TesteeRepository;
use std::sync::Arc;

/// Testee repository with cache-aside reads by id.
pub struct CachedTesteeRepository {
    inner: Arc<dyn TesteeRepository>,
    entity: EntityCache<Testee>,
    keys: CacheKeyBuilder,
}

impl CachedTesteeRepository {
    /// Decorates `inner` with the testee cache of `context`.
    #[must_use]
    pub fn new(inner: Arc<dyn TesteeRepository>, context: &CacheContext) -> Self {
        Self {
            inner,
            entity: context.entity("testee", context.settings().entities.testee),
            keys: context.keys().clone(),
        }
    }

    /// Preloads testees by id.
    pub async fn warmup(&self, ids: &[u64]) -> WarmupReport {
        let mut report = WarmupReport::new("testee");
        for &raw in ids {
            let id = TesteeId::new(raw);
            let outcome = self
                .entity
                .warm(&self.keys.testee(id), || self.inner.find_by_id(id))
                .await;
            report.record(outcome);
        }
        report
    }
}

#[async_trait]
impl TesteeRepository for CachedTesteeRepository {
    async fn save(&self, testee: &Testee) -> QsResult<Testee> {
        let saved = self.inner.save(testee).await?;
        self.entity.on_write(&self.keys.testee(saved.id), &saved).await;
        Ok(saved)
    }

    async fn update(&self, testee: &Testee) -> QsResult<Testee> {
        let updated = self.inner.update(testee).await?;
        self.entity.on_write(&self.keys.testee(updated.id), &updated).await;
        Ok(updated)
    }

    async fn delete(&self, id: TesteeId) -> QsResult<()> {
        self.inner.delete(id).await?;
        self.entity.invalidate(&self.keys.testee(id)).await;
        Ok(())
    }

    async fn find_by_id(&self, id: TesteeId) -> QsResult<Option<Testee>> {
        self.entity
            .read_through(&self.keys.testee(id), || self.inner.find_by_id(id))
            .await
    }

    async fn find_by_profile(&self, org_id: OrgId, profile_id: ProfileId) -> QsResult<Option<Testee>> {
        self.inner.find_by_profile(org_id, profile_id).await
    }

    async fn find_by_org_and_name(&self, org_id: OrgId, name: &str) -> QsResult<Vec<Testee>> {
        self.inner.find_by_org_and_name(org_id, name).await
    }

    async fn list_by_org(&self, org_id: OrgId, offset: usize, limit: usize) -> QsResult<Vec<Testee>> {
        self.inner.list_by_org(org_id, offset, limit).await
    }

    async fn list_by_tags(&self, org_id: OrgId, tags: &[String], offset: usize, limit: usize) -> QsResult<Vec<Testee>> {
        self.inner.list_by_tags(org_id, tags, offset, limit).await
    }

    async fn list_key_focus(&self, org_id: OrgId, offset: usize, limit: usize) -> QsResult<Vec<Testee>> {
        self.inner.list_key_focus(org_id, offset, limit).await
    }

    async fn list_by_profile_ids(&self, profile_ids: &[ProfileId], offset: usize, limit: usize) -> QsResult<Vec<Testee>> {
        self.inner.list_by_profile_ids(profile_ids, offset, limit).await
    }

    async fn count(&self, org_id: OrgId) -> QsResult<u64> {
        self.inner.count(org_id).await
    }
}
