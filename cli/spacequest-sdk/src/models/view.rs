//! Client side pagination over a filtered collection.
//!
//! Everything here is a pure function of the number of matching items and
//! the requested page, so a view can always be re-derived from the raw
//! snapshot, the committed search term and the page.

/// Number of items on one page.
pub const PAGE_SIZE: usize = 10;

/// Number of pages needed for `total` items. Never less than one.
pub fn page_count(total: usize) -> u32 {
    total.div_ceil(PAGE_SIZE).max(1) as u32
}

/// Bring `page` into `[1, page_count]`.
pub fn clamp_page(page: u32, page_count: u32) -> u32 {
    page.clamp(1, page_count.max(1))
}

/// The slice of a filtered collection that is visible on one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub page_count: u32,
    pub total_count: usize,
}

impl PageWindow {
    /// Window onto `total_count` items at `page`, clamped into range.
    pub fn new(total_count: usize, page: u32) -> Self {
        let page_count = page_count(total_count);
        Self {
            page: clamp_page(page, page_count),
            page_count,
            total_count,
        }
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.page_count
    }

    /// Index range of the visible items.
    pub fn range(&self) -> std::ops::Range<usize> {
        let start = ((self.page - 1) as usize * PAGE_SIZE).min(self.total_count);
        let end = (self.page as usize * PAGE_SIZE).min(self.total_count);
        start..end
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let range = self.range();
        &items[range.start.min(items.len())..range.end.min(items.len())]
    }
}
