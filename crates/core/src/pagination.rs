//! Page continuation logic
//!
//! Pure functions deciding whether a paginated fetch should ask for another
//! page, and what that request looks like. The I/O loop lives in the shell;
//! everything here works on already-decoded pages.

use serde::{Deserialize, Serialize};

/// One batch of items returned by a paginated API.
///
/// `next_cursor` is `None` exactly when the server signals that no further
/// pages exist (for cursor-style APIs). `has_more` carries an explicit flag
/// when the API provides one (`hasNextPage`, `meta.has_more`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
    pub has_more: Option<bool>,
    pub total_count: Option<u64>,
}

impl<T> Page<T> {
    /// A page from a cursor-style API.
    pub fn with_cursor(items: Vec<T>, next_cursor: Option<String>) -> Self {
        Self {
            items,
            next_cursor,
            has_more: None,
            total_count: None,
        }
    }

    /// A page from an offset-style API that does not say whether more pages exist.
    pub fn offset(items: Vec<T>) -> Self {
        Self {
            items,
            next_cursor: None,
            has_more: None,
            total_count: None,
        }
    }

    pub fn has_more(mut self, has_more: bool) -> Self {
        self.has_more = Some(has_more);
        self
    }

    pub fn total_count(mut self, total_count: u64) -> Self {
        self.total_count = Some(total_count);
        self
    }
}

/// Which continuation signal the API exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageStyle {
    /// Follow `next_cursor` until the server stops returning one.
    #[default]
    Cursor,
    /// Advance an item offset. Uses `has_more` when present, otherwise treats a
    /// short page as the last one.
    Offset,
}

/// Parameters for a single page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Opaque continuation token from the previous page. `None` on the first request.
    pub cursor: Option<String>,
    /// Number of items already received before this page.
    pub offset: usize,
    pub page_size: usize,
}

impl PageRequest {
    pub fn first(page_size: usize) -> Self {
        Self {
            cursor: None,
            offset: 0,
            page_size,
        }
    }

    /// 1-indexed page number, for APIs that paginate by page rather than offset.
    pub fn page_number(&self) -> usize {
        if self.page_size == 0 {
            return 1;
        }
        self.offset / self.page_size + 1
    }
}

/// Decide the next request after receiving `page` for `request`.
///
/// Returns `None` when the fetch is exhausted. An explicit `has_more == false`
/// always wins; the short-page heuristic is only consulted for offset-style
/// APIs that give no flag at all.
pub fn next_request<T>(
    style: PageStyle,
    request: &PageRequest,
    page: &Page<T>,
) -> Option<PageRequest> {
    let received = page.items.len();

    if received == 0 || page.has_more == Some(false) {
        return None;
    }

    let offset = request.offset + received;

    match style {
        PageStyle::Cursor => page.next_cursor.as_ref().map(|cursor| PageRequest {
            cursor: Some(cursor.clone()),
            offset,
            page_size: request.page_size,
        }),
        PageStyle::Offset => {
            let more = match page.has_more {
                Some(flag) => flag,
                None => received >= request.page_size,
            };

            more.then(|| PageRequest {
                cursor: page.next_cursor.clone(),
                offset,
                page_size: request.page_size,
            })
        }
    }
}

/// Append `page_items` to `items`, honouring an optional cap on the total.
///
/// Returns `true` when the cap has been reached and fetching should stop.
pub fn accumulate<T>(items: &mut Vec<T>, page_items: Vec<T>, max_items: Option<usize>) -> bool {
    match max_items {
        Some(max) => {
            let room = max.saturating_sub(items.len());
            items.extend(page_items.into_iter().take(room));
            items.len() >= max
        }
        None => {
            items.extend(page_items);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(offset: usize, page_size: usize) -> PageRequest {
        PageRequest {
            cursor: None,
            offset,
            page_size,
        }
    }

    #[test]
    fn test_cursor_follows_next_cursor() {
        let page = Page::with_cursor(vec![1, 2], Some("abc".to_string()));
        let next = next_request(PageStyle::Cursor, &req(0, 2), &page).unwrap();

        assert_eq!(next.cursor.as_deref(), Some("abc"));
        assert_eq!(next.offset, 2);
        assert_eq!(next.page_size, 2);
    }

    #[test]
    fn test_cursor_stops_without_cursor() {
        let page = Page::with_cursor(vec![1, 2], None);
        assert!(next_request(PageStyle::Cursor, &req(0, 2), &page).is_none());
    }

    #[test]
    fn test_cursor_stops_when_has_more_false() {
        let page = Page::with_cursor(vec![1, 2], Some("stale".to_string())).has_more(false);
        assert!(next_request(PageStyle::Cursor, &req(0, 2), &page).is_none());
    }

    #[test]
    fn test_empty_page_stops() {
        let page: Page<u32> = Page::with_cursor(vec![], Some("abc".to_string()));
        assert!(next_request(PageStyle::Cursor, &req(0, 2), &page).is_none());

        let page: Page<u32> = Page::offset(vec![]);
        assert!(next_request(PageStyle::Offset, &req(0, 2), &page).is_none());
    }

    #[test]
    fn test_offset_short_page_is_last() {
        let page = Page::offset(vec![1]);
        assert!(next_request(PageStyle::Offset, &req(4, 2), &page).is_none());
    }

    #[test]
    fn test_offset_full_page_continues() {
        let page = Page::offset(vec![1, 2]);
        let next = next_request(PageStyle::Offset, &req(4, 2), &page).unwrap();
        assert_eq!(next.offset, 6);
        assert_eq!(next.page_number(), 4);
    }

    #[test]
    fn test_offset_explicit_flag_beats_heuristic() {
        // A short page with an explicit "more" flag keeps going.
        let page = Page::offset(vec![1]).has_more(true);
        let next = next_request(PageStyle::Offset, &req(0, 10), &page).unwrap();
        assert_eq!(next.offset, 1);

        // A full page flagged as the last one stops.
        let page = Page::offset(vec![1, 2]).has_more(false);
        assert!(next_request(PageStyle::Offset, &req(0, 2), &page).is_none());
    }

    #[test]
    fn test_page_number() {
        assert_eq!(req(0, 20).page_number(), 1);
        assert_eq!(req(20, 20).page_number(), 2);
        assert_eq!(req(45, 20).page_number(), 3);
        assert_eq!(req(5, 0).page_number(), 1);
    }

    #[test]
    fn test_accumulate_without_cap() {
        let mut items = vec![1];
        assert!(!accumulate(&mut items, vec![2, 3], None));
        assert_eq!(items, vec![1, 2, 3]);
    }

    #[test]
    fn test_accumulate_trims_final_page() {
        let mut items = vec![1, 2];
        assert!(accumulate(&mut items, vec![3, 4, 5], Some(4)));
        assert_eq!(items, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_accumulate_exact_cap() {
        let mut items = vec![];
        assert!(accumulate(&mut items, vec![1, 2], Some(2)));
        assert_eq!(items, vec![1, 2]);
    }
}
