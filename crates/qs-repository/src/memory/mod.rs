//! In-memory repositories.
//!
//! Each repository keeps its aggregates in a `parking_lot::RwLock<HashMap>`
//! and assigns ids from an atomic sequence. Locks are never held across an
//! `.await`.

mod assessment;
mod plan;
mod questionnaire;
mod scale;
mod testee;

pub use assessment::InMemoryAssessmentRepository;
pub use plan::InMemoryPlanRepository;
pub use questionnaire::InMemoryQuestionnaireRepository;
pub use scale::InMemoryScaleRepository;
pub use testee::InMemoryTesteeRepository;

use qs_core::PageRequest;

/// Slices an already-sorted list into one page and returns it with the total.
pub(crate) fn paginate<T>(items: Vec<T>, page: PageRequest) -> (Vec<T>, u64) {
    let total = items.len() as u64;
    let start = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
    let items = items.into_iter().skip(start).take(limit).collect();
    (items, total)
}

/// Slices with raw offset and limit.
pub(crate) fn window<T>(items: Vec<T>, offset: usize, limit: usize) -> Vec<T> {
    items.into_iter().skip(offset).take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate() {
        let (items, total) = paginate((1..=7).collect::<Vec<_>>(), PageRequest::new(2, 3));
        assert_eq!(items, vec![4, 5, 6]);
        assert_eq!(total, 7);

        let (items, total) = paginate((1..=7).collect::<Vec<_>>(), PageRequest::new(4, 3));
        assert!(items.is_empty());
        assert_eq!(total, 7);
    }

    #[test]
    fn test_window() {
        assert_eq!(window(vec![1, 2, 3, 4], 1, 2), vec![2, 3]);
        assert!(window(vec![1, 2], 5, 2).is_empty());
    }
}
