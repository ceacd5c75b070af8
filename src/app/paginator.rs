//! Page slicing for post and comment listings.
//!
//! A listing is an ordered sequence prepared by the caller (already
//! filtered, newest first). The paginator never reorders or filters it; it
//! only decides which page to serve and which slice belongs to that page.

use serde::Serialize;

/// Items per listing page.
pub const POSTS_PER_PAGE: usize = 10;

/// The page chosen for a request, computed from the item count alone.
///
/// Resolution rules:
/// - an absent or non-numeric request serves page 1;
/// - a request past the last page, or below 1, serves the last page;
/// - an empty listing still has one (empty) page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: usize,
    pub num_pages: usize,
    pub count: usize,
    pub per_page: usize,
}

impl PageWindow {
    pub fn resolve(count: usize, per_page: usize, requested: Option<&str>) -> Self {
        let per_page = per_page.max(1);
        let num_pages = if count == 0 {
            1
        } else {
            count.div_ceil(per_page)
        };

        let number = match parse_page_number(requested) {
            None => 1,
            Some(n) if n < 1 => num_pages,
            Some(n) if n as u64 > num_pages as u64 => num_pages,
            Some(n) => n as usize,
        };

        Self {
            number,
            num_pages,
            count,
            per_page,
        }
    }

    pub fn offset(&self) -> usize {
        (self.number - 1) * self.per_page
    }

    pub fn limit(&self) -> usize {
        self.per_page
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }
}

/// One page of a listing plus navigation metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub object_list: Vec<T>,
    pub number: usize,
    pub num_pages: usize,
    pub count: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    /// Builds a page from a resolved window and the items already fetched
    /// for it (at most `window.limit()` of them).
    pub fn from_window(window: PageWindow, mut items: Vec<T>) -> Self {
        items.truncate(window.limit());
        Self {
            object_list: items,
            number: window.number,
            num_pages: window.num_pages,
            count: window.count,
            has_next: window.has_next(),
            has_previous: window.has_previous(),
        }
    }

    pub fn len(&self) -> usize {
        self.object_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.object_list.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.object_list.iter()
    }

    pub fn next_page_number(&self) -> Option<usize> {
        self.has_next.then_some(self.number + 1)
    }

    pub fn previous_page_number(&self) -> Option<usize> {
        self.has_previous.then_some(self.number - 1)
    }
}

/// Serves one page of an in-memory ordered sequence.
pub fn paginate<T: Clone>(items: &[T], per_page: usize, requested: Option<&str>) -> Page<T> {
    let window = PageWindow::resolve(items.len(), per_page, requested);
    let start = window.offset().min(items.len());
    let end = (start + window.limit()).min(items.len());
    Page::from_window(window, items[start..end].to_vec())
}

/// Reads a raw `?page=` value. Only integers count; `"2.0"` or `"1e1"`
/// yield `None`.
pub fn parse_page_number(raw: Option<&str>) -> Option<i64> {
    raw?.trim().parse::<i64>().ok()
}
