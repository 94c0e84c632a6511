//! Filter conditions for list and count queries.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ordered set of `field = value` filters.
///
/// Keys are kept sorted so that two logically equal filter sets always
/// render to the same canonical string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryConditions(BTreeMap<String, String>);

impl QueryConditions {
    /// Creates an empty condition set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a condition, replacing any previous value for the field.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Inserts a condition in place.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.0.insert(field.into(), value.into());
    }

    /// Returns the value for a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Returns true when no condition is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of conditions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over conditions in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns true when the set holds exactly one condition equal to `field = value`.
    #[must_use]
    pub fn is_only(&self, field: &str, value: &str) -> bool {
        self.0.len() == 1 && self.get(field) == Some(value)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryConditions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_iteration() {
        let conditions = QueryConditions::new().with("status", "published").with("category", "mood");
        let fields: Vec<_> = conditions.iter().map(|(k, _)| k).collect();
        assert_eq!(fields, vec!["category", "status"]);
    }

    #[test]
    fn test_is_only() {
        let published = QueryConditions::new().with("status", "published");
        assert!(published.is_only("status", "published"));
        assert!(!published.clone().with("category", "x").is_only("status", "published"));
        assert!(!QueryConditions::new().is_only("status", "published"));
    }

    #[test]
    fn test_from_iter() {
        let conditions: QueryConditions = [("a", "1"), ("b", "2")].into_iter().collect();
        assert_eq!(conditions.len(), 2);
        assert_eq!(conditions.get("b"), Some("2"));
    }
}
