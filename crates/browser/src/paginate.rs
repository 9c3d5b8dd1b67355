use clipflow_api::Pagination;

/// Tracks which page of a collection is showing.
///
/// The page is always within `1..=total_pages()`. Navigation requests outside
/// that range are ignored rather than clamped, so a stale "Next" click on
/// the last page does nothing instead of re-fetching the same page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginator {
    page: u32,
    per_page: u32,
    total: u64,
    last_page: u32,
}

impl Paginator {
    pub fn new(per_page: u32) -> Self {
        Self {
            page: 1,
            per_page: per_page.max(1),
            total: 0,
            last_page: 1,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn total_pages(&self) -> u32 {
        self.last_page
    }

    /// Move to page `n`. Returns `false` (and changes nothing) when `n` is
    /// outside `1..=total_pages()` or already current.
    pub fn set_page(&mut self, n: u32) -> bool {
        if n < 1 || n > self.last_page || n == self.page {
            return false;
        }
        self.page = n;
        true
    }

    pub fn next(&mut self) -> bool {
        self.set_page(self.page.saturating_add(1))
    }

    pub fn prev(&mut self) -> bool {
        self.set_page(self.page.saturating_sub(1))
    }

    /// Back to the first page, as after any filter or search change.
    pub fn reset(&mut self) {
        self.page = 1;
    }

    /// Adopt the metadata the server sent with a page.
    ///
    /// Returns `true` when the page we asked for no longer exists and the
    /// current page had to be pulled back to the server's last page.
    pub fn apply(&mut self, pagination: &Pagination) -> bool {
        self.per_page = pagination.per_page.max(1);
        self.total = pagination.total;
        self.last_page = pagination.last_page.max(1);
        let page = pagination.current_page.max(1);
        self.page = page.min(self.last_page);
        page > self.last_page
    }

    /// Account for `removed` rows having been deleted from the current page,
    /// `remaining` of which are still showing.
    ///
    /// Returns `true` when the current page was emptied and the paginator
    /// went back to page 1.
    pub fn after_delete(&mut self, removed: usize, remaining: usize) -> bool {
        self.total = self.total.saturating_sub(removed as u64);
        self.last_page = self.total.div_ceil(u64::from(self.per_page)).max(1).try_into().unwrap_or(u32::MAX);
        if remaining == 0 && self.page > 1 {
            self.page = 1;
            return true;
        }
        self.page = self.page.min(self.last_page);
        false
    }

    /// Zero-based offset of the first row on the current page.
    pub fn start_index(&self) -> u64 {
        (u64::from(self.page) - 1) * u64::from(self.per_page)
    }

    /// Zero-based offset one past the last row on the current page.
    pub fn end_index(&self) -> u64 {
        (self.start_index() + u64::from(self.per_page)).min(self.total)
    }

    /// `Showing X to Y of Z`.
    pub fn summary(&self) -> String {
        if self.total == 0 {
            return "Showing 0 to 0 of 0".to_string();
        }
        let end = self.end_index();
        let start = (self.start_index() + 1).min(end);
        format!("Showing {start} to {end} of {}", self.total)
    }
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(crate::DEFAULT_PER_PAGE)
    }
}
