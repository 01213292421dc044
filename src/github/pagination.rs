//! Page-number pagination for GitHub list endpoints.
//!
//! GitHub list endpoints are walked with a fixed page size. A page shorter
//! than the page size ends the walk, and a hard page ceiling guards against
//! runaway loops when a pathological response keeps returning full pages.

/// Items requested per page on every list endpoint.
pub const PAGE_SIZE: u8 = 100;

/// Maximum number of pages fetched for one listing.
pub const MAX_PAGES: u32 = 10;

/// Cursor over the pages of one listing.
///
/// # Example
///
/// ```
/// use revwatch::github::pagination::PageCursor;
///
/// let mut cursor = PageCursor::new();
/// assert_eq!(cursor.page(), 1);
/// assert!(cursor.advance(100));
/// assert_eq!(cursor.page(), 2);
/// assert!(!cursor.advance(3));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    page: u32,
    per_page: u8,
    max_pages: u32,
}

impl PageCursor {
    /// Starts at page 1 with the default page size and ceiling.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_limits(PAGE_SIZE, MAX_PAGES)
    }

    /// Starts at page 1 with explicit limits.
    #[must_use]
    pub const fn with_limits(per_page: u8, max_pages: u32) -> Self {
        Self {
            page: 1,
            per_page,
            max_pages,
        }
    }

    /// Returns the current page number (1-based).
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Returns the number of items requested per page.
    #[must_use]
    pub const fn per_page(&self) -> u8 {
        self.per_page
    }

    /// Records how many items the current page returned and moves to the next
    /// page.
    ///
    /// Returns `false` when the listing is complete: the page was short or the
    /// ceiling has been reached.
    pub fn advance(&mut self, items_on_page: usize) -> bool {
        let full_page = items_on_page >= usize::from(self.per_page);
        if !full_page || self.page >= self.max_pages {
            return false;
        }
        self.page += 1;
        true
    }
}

impl Default for PageCursor {
    fn default() -> Self {
        Self::new()
    }
}
