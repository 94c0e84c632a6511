//! Pagination types.
//!
//! Pages are 1-based, matching the query API of the persistence layer.

use serde::{Deserialize, Serialize};

/// Request for a page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number (1-based).
    pub page: u32,
    /// Number of items per page.
    pub page_size: u32,
}

impl PageRequest {
    /// Default page size.
    pub const DEFAULT_SIZE: u32 = 20;
    /// Maximum allowed page size.
    pub const MAX_SIZE: u32 = 200;

    /// Creates a new page request, clamping the size and lifting page 0 to 1.
    #[must_use]
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, Self::MAX_SIZE),
        }
    }

    /// Creates a request for the first page with the default size.
    #[must_use]
    pub fn first() -> Self {
        Self::new(1, Self::DEFAULT_SIZE)
    }

    /// Returns the offset of the first item.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page.saturating_sub(1) as u64) * self.page_size as u64
    }

    /// Returns the limit (page size).
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.page_size as u64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first()
    }
}

/// One page of results together with totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Total number of matching items.
    pub total: u64,
    /// Page number (1-based).
    pub page: u32,
    /// Requested page size.
    pub page_size: u32,
    /// Total number of pages.
    pub total_pages: u64,
}

impl<T> Page<T> {
    /// Creates a page, computing the page count from the total.
    #[must_use]
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        let size = u64::from(request.page_size.max(1));
        Self {
            items,
            total,
            page: request.page,
            page_size: request.page_size,
            total_pages: total.div_ceil(size),
        }
    }

    /// Creates an empty page.
    #[must_use]
    pub fn empty(request: PageRequest) -> Self {
        Self::new(Vec::new(), request, 0)
    }

    /// Maps the page content to a different type.
    #[must_use]
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
        }
    }

    /// Returns true if the page is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of items on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if there is a next page.
    #[must_use]
    pub fn has_next(&self) -> bool {
        u64::from(self.page) < self.total_pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_offset() {
        assert_eq!(PageRequest::new(1, 20).offset(), 0);
        assert_eq!(PageRequest::new(2, 20).offset(), 20);
        assert_eq!(PageRequest::new(6, 15).offset(), 75);
    }

    #[test]
    fn test_page_request_clamps() {
        let req = PageRequest::new(0, 1000);
        assert_eq!(req.page, 1);
        assert_eq!(req.page_size, PageRequest::MAX_SIZE);
        assert_eq!(PageRequest::new(1, 0).page_size, 1);
    }

    #[test]
    fn test_page_totals() {
        let page: Page<i32> = Page::new(vec![1], PageRequest::new(1, 5), 11);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next());

        let last: Page<i32> = Page::new(vec![1], PageRequest::new(3, 5), 11);
        assert!(!last.has_next());
    }

    #[test]
    fn test_page_map_and_empty() {
        let page = Page::new(vec![1, 2, 3], PageRequest::first(), 3).map(|x| x * 2);
        assert_eq!(page.items, vec![2, 4, 6]);
        let empty: Page<i32> = Page::empty(PageRequest::first());
        assert!(empty.is_empty());
        assert_eq!(empty.total_pages, 0);
    }
}
