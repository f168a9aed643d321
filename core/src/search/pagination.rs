//! Result pagination

use crate::error::{LunaryError, LunaryResult};

/// Page sizes the session accepts
pub const PER_PAGE_OPTIONS: [u32; 4] = [10, 20, 50, 100];

/// Pagination cursor; `page` starts at 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageState {
    page: u32,
    per_page: u32,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}

impl PageState {
    /// Current page (1-based)
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Results per page
    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Offset of the first result on the current page
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.per_page)
    }

    /// Number of pages needed for `total` results
    pub fn page_count(&self, total: u64) -> u32 {
        let per_page = u64::from(self.per_page);
        u32::try_from(total.div_ceil(per_page)).unwrap_or(u32::MAX)
    }

    /// Change the page size and go back to page 1
    pub fn set_per_page(&mut self, per_page: u32) -> LunaryResult<()> {
        if !PER_PAGE_OPTIONS.contains(&per_page) {
            return Err(LunaryError::validation(format!(
                "perPage must be one of {:?}",
                PER_PAGE_OPTIONS
            )));
        }
        self.per_page = per_page;
        self.page = 1;
        Ok(())
    }

    /// Check if a page after the current one exists
    pub fn has_next(&self, total: u64) -> bool {
        u64::from(self.page) * u64::from(self.per_page) < total
    }

    /// Check if a page before the current one exists
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Advance one page. Returns `false` if already on the last page.
    pub fn next(&mut self, total: u64) -> bool {
        if !self.has_next(total) {
            return false;
        }
        self.page += 1;
        true
    }

    /// Go back one page. Returns `false` on page 1.
    pub fn prev(&mut self) -> bool {
        if !self.has_prev() {
            return false;
        }
        self.page -= 1;
        true
    }

    /// Jump to a page, clamped to the pages `total` results fill.
    ///
    /// Returns `true` if the page changed.
    pub fn goto(&mut self, page: u32, total: u64) -> bool {
        let last = self.page_count(total).max(1);
        let page = page.clamp(1, last);
        if page == self.page {
            return false;
        }
        self.page = page;
        true
    }

    /// Back to page 1
    pub fn reset(&mut self) {
        self.page = 1;
    }
}
