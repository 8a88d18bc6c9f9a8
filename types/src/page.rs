//! Pagination envelopes shared by every list endpoint.

use serde::{Deserialize, Serialize};

/// A `(page, page_size)` pair; pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub const DEFAULT_PAGE_SIZE: u32 = 20;

    #[must_use]
    pub const fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    #[must_use]
    pub const fn first(page_size: u32) -> Self {
        Self { page: 1, page_size }
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self {
            page: self.page + 1,
            ..self
        }
    }

    #[must_use]
    pub const fn previous(self) -> Self {
        Self {
            page: if self.page > 1 { self.page - 1 } else { 1 },
            ..self
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first(Self::DEFAULT_PAGE_SIZE)
    }
}

/// One page of a server-side collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub total_pages: Option<u32>,
}

impl<T> Page<T> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        match self.total_pages {
            Some(total) => self.page < total,
            None => self.items.len() as u32 == self.page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_navigation_clamps_at_one() {
        let first = PageRequest::first(20);
        assert_eq!(first.previous().page, 1);
        assert_eq!(first.next().page, 2);
        assert_eq!(first.next().previous(), first);
    }

    #[test]
    fn has_next_uses_total_pages_when_known() {
        let page = Page::<u8> {
            items: vec![1, 2],
            page: 2,
            page_size: 2,
            total: Some(6),
            total_pages: Some(3),
        };
        assert!(page.has_next());

        let last = Page::<u8> {
            page: 3,
            total_pages: Some(3),
            ..page
        };
        assert!(!last.has_next());
    }
}
