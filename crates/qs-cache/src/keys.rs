//! Cache key construction.
//!
//! Keys follow `[namespace:]entity:identifier`. Parameterized queries fold
//! every result-affecting input into an 8 hex character suffix derived from
//! the SHA-256 of the canonical `name=value&name=value` string.

use qs_core::{AssessmentId, PlanId, TesteeId};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Key of the global published scale list.
pub const SCALE_LIST_KEY: &str = "scale:list:v1";

/// Builds cache keys for every cached entity and query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheKeyBuilder {
    namespace: String,
}

impl CacheKeyBuilder {
    /// Creates a builder. An empty namespace leaves keys unprefixed.
    #[must_use]
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    /// Returns the namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Prefixes a raw key or pattern with the namespace.
    #[must_use]
    pub fn apply(&self, key: &str) -> String {
        if self.namespace.is_empty() {
            key.to_string()
        } else {
            format!("{}:{}", self.namespace, key)
        }
    }

    /// Medical scale by code. Codes are case-insensitive.
    #[must_use]
    pub fn scale(&self, code: &str) -> String {
        self.apply(&format!("scale:{}", code.to_lowercase()))
    }

    /// Global published scale list.
    #[must_use]
    pub fn scale_list(&self) -> String {
        self.apply(SCALE_LIST_KEY)
    }

    /// Questionnaire by code, optionally pinned to a version.
    #[must_use]
    pub fn questionnaire(&self, code: &str, version: Option<&str>) -> String {
        match version.filter(|v| !v.is_empty()) {
            Some(version) => self.apply(&format!("questionnaire:{code}:{version}")),
            None => self.apply(&format!("questionnaire:{code}")),
        }
    }

    /// Every versioned key of a questionnaire.
    #[must_use]
    pub fn questionnaire_pattern(&self, code: &str) -> String {
        self.apply(&format!("questionnaire:{code}:*"))
    }

    /// `assessment:detail:<id>`
    #[must_use]
    pub fn assessment_detail(&self, id: AssessmentId) -> String {
        self.apply(&format!("assessment:detail:{id}"))
    }

    /// `assessment:status:<id>`
    #[must_use]
    pub fn assessment_status(&self, id: AssessmentId) -> String {
        self.apply(&format!("assessment:status:{id}"))
    }

    /// `testee:info:<id>`
    #[must_use]
    pub fn testee(&self, id: TesteeId) -> String {
        self.apply(&format!("testee:info:{id}"))
    }

    /// `plan:info:<id>`
    #[must_use]
    pub fn plan(&self, id: PlanId) -> String {
        self.apply(&format!("plan:info:{id}"))
    }

    /// One page of a testee's assessment list.
    #[must_use]
    pub fn assessment_list(&self, testee_id: TesteeId, status: &str, page: u32, page_size: u32) -> String {
        let mut params = BTreeMap::new();
        params.insert("page", page.to_string());
        params.insert("page_size", page_size.to_string());
        params.insert("status", status.to_string());
        self.apply(&format!("assessment:list:{testee_id}:{}", Self::query_hash(&params)))
    }

    /// Every cached page of a testee's assessment list.
    #[must_use]
    pub fn assessment_list_pattern(&self, testee_id: TesteeId) -> String {
        self.apply(&format!("assessment:list:{testee_id}:*"))
    }

    /// Hashes query parameters into an 8 hex character suffix.
    ///
    /// Parameters are rendered in key order as `k=v&k=v`, so logically equal
    /// parameter sets always produce the same suffix.
    #[must_use]
    pub fn query_hash<K: AsRef<str>, V: AsRef<str>>(params: &BTreeMap<K, V>) -> String {
        let canonical = params
            .iter()
            .map(|(k, v)| format!("{}={}", k.as_ref(), v.as_ref()))
            .collect::<Vec<_>>()
            .join("&");
        let digest = Sha256::digest(canonical.as_bytes());
        hex::encode(&digest[..4])
    }
}
