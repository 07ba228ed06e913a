//! Page arithmetic for paginated lists.

/// A resolved page within a list of `total_items`.
///
/// Requested pages outside the valid range clamp to the nearest page, so a
/// stale `?page=` link still shows something.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based current page.
    pub page: u32,
    /// Number of pages; at least 1 even for an empty list.
    pub total_pages: u32,
    pub per_page: u32,
    pub total_items: u64,
}

impl Pagination {
    /// Resolve a requested page.
    #[must_use]
    pub fn new(requested: Option<u32>, per_page: u32, total_items: u64) -> Self {
        let per_page = per_page.max(1);
        let pages = total_items.div_ceil(u64::from(per_page)).max(1);
        let total_pages = u32::try_from(pages).unwrap_or(u32::MAX);
        let page = requested.unwrap_or(1).clamp(1, total_pages);
        Self {
            page,
            total_pages,
            per_page,
            total_items,
        }
    }

    /// Row offset for the current page.
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }

    /// Row limit for the current page.
    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    #[must_use]
    pub const fn previous(&self) -> u32 {
        self.page.saturating_sub(1)
    }

    #[must_use]
    pub const fn next(&self) -> u32 {
        self.page.saturating_add(1)
    }
}
