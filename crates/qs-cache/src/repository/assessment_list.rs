//! Cached "my assessments" query.
//!
//! One entry per (testee, status filter, page, page size). Entries of a testee
//! cannot be addressed individually after a write, so invalidation sweeps the
//! testee's key prefix.

use crate::{CacheContext, EntityCache};
use qs_core::domain::Assessment;
use qs_core::{Page, PageRequest, QsResult, TesteeId};
use std::future::Future;

/// One page of a testee's assessments.
pub type AssessmentList = Page<Assessment>;

/// Cache of a testee's assessment list pages.
pub struct MyAssessmentListCache {
    context: CacheContext,
    entity: EntityCache<AssessmentList>,
}

impl MyAssessmentListCache {
    /// Creates the list cache over `context`.
    #[must_use]
    pub fn new(context: &CacheContext) -> Self {
        Self {
            entity: context.entity("assessment_list", context.settings().entities.assessment_list),
            context: context.clone(),
        }
    }

    fn key(&self, testee_id: TesteeId, status: &str, page: PageRequest) -> String {
        self.context
            .keys()
            .assessment_list(testee_id, status, page.page, page.page_size)
    }

    /// Returns the cached page, loading it on a miss.
    ///
    /// `status` is the filter value; empty means unfiltered.
    pub async fn get_or_load<F, Fut>(
        &self,
        testee_id: TesteeId,
        status: &str,
        page: PageRequest,
        load: F,
    ) -> QsResult<AssessmentList>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = QsResult<AssessmentList>>,
    {
        let key = self.key(testee_id, status, page);
        let list = self
            .entity
            .read_through(&key, || async move { load().await.map(Some) })
            .await?;
        Ok(list.unwrap_or_else(|| Page::empty(page)))
    }

    /// Caches a page computed elsewhere.
    pub async fn set(&self, testee_id: TesteeId, status: &str, page: PageRequest, list: &AssessmentList) -> bool {
        self.entity.store(&self.key(testee_id, status, page), list).await
    }

    /// Removes every cached page of a testee before returning.
    pub async fn invalidate(&self, testee_id: TesteeId) -> bool {
        self.entity
            .invalidate_pattern(&self.context.keys().assessment_list_pattern(testee_id))
            .await
    }
}
