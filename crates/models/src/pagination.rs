//! Page window derived from a search response.

use serde::Serialize;

/// Derived result window. `total_pages` is always `ceil(total / limit)` and
/// `page` is always within `1..=max(1, total_pages)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PaginationState {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl PaginationState {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let limit = limit.max(1);
        let total_pages = u32::try_from(total.div_ceil(u64::from(limit))).unwrap_or(u32::MAX);
        let page = page.clamp(1, total_pages.max(1));
        Self { page, limit, total, total_pages }
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
}
