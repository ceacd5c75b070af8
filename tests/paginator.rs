//! Paginator Tests
//!
//! Covers page resolution and slicing, independent of any listing source.

use scribe::app::paginator::{paginate, parse_page_number, PageWindow, POSTS_PER_PAGE};

fn items(n: usize) -> Vec<usize> {
    (0..n).collect()
}

// ===========================================================================
// Page sizes
// ===========================================================================

#[test]
fn first_two_pages_hold_expected_counts() {
    for n in [0, 1, 9, 10, 11, 13, 20, 21, 35] {
        let items = items(n);
        let first = paginate(&items, POSTS_PER_PAGE, Some("1"));
        assert_eq!(first.len(), n.min(10), "page 1 with {} items", n);

        let second = paginate(&items, POSTS_PER_PAGE, Some("2"));
        if n > 10 {
            assert_eq!(second.len(), (n - 10).min(10), "page 2 with {} items", n);
        }
    }
}

#[test]
fn thirteen_items_give_ten_then_three() {
    let items = items(13);

    let first = paginate(&items, POSTS_PER_PAGE, None);
    assert_eq!(first.object_list, (0..10).collect::<Vec<_>>());
    assert_eq!(first.num_pages, 2);
    assert!(first.has_next);
    assert!(!first.has_previous);
    assert_eq!(first.next_page_number(), Some(2));

    let second = paginate(&items, POSTS_PER_PAGE, Some("2"));
    assert_eq!(second.object_list, vec![10, 11, 12]);
    assert!(!second.has_next);
    assert!(second.has_previous);
    assert_eq!(second.previous_page_number(), Some(1));
}

#[test]
fn pagination_is_idempotent() {
    let items = items(27);
    for page in ["1", "2", "3", "abc", "99"] {
        assert_eq!(
            paginate(&items, POSTS_PER_PAGE, Some(page)),
            paginate(&items, POSTS_PER_PAGE, Some(page))
        );
    }
}

#[test]
fn pages_keep_input_order() {
    let items: Vec<usize> = (0..25).rev().collect();
    let second = paginate(&items, POSTS_PER_PAGE, Some("2"));
    assert_eq!(second.object_list, (5..15).rev().collect::<Vec<_>>());
}

// ===========================================================================
// Edge cases
// ===========================================================================

#[test]
fn empty_listing_has_one_empty_page() {
    let page = paginate::<usize>(&[], POSTS_PER_PAGE, None);
    assert!(page.is_empty());
    assert_eq!(page.number, 1);
    assert_eq!(page.num_pages, 1);
    assert!(!page.has_next);
    assert!(!page.has_previous);
}

#[test]
fn out_of_range_page_serves_last_page() {
    let items = items(13);
    let page = paginate(&items, POSTS_PER_PAGE, Some("99"));
    assert_eq!(page.number, 2);
    assert_eq!(page.len(), 3);

    let page = paginate(&items, POSTS_PER_PAGE, Some("0"));
    assert_eq!(page.number, 2);

    let page = paginate(&items, POSTS_PER_PAGE, Some("-3"));
    assert_eq!(page.number, 2);
}

#[test]
fn non_numeric_page_serves_first_page() {
    let items = items(13);
    for raw in [None, Some(""), Some("abc"), Some("1.5"), Some("NaN")] {
        let page = paginate(&items, POSTS_PER_PAGE, raw);
        assert_eq!(page.number, 1, "requested {:?}", raw);
        assert_eq!(page.len(), 10);
    }
}

#[test]
fn only_integers_are_page_numbers() {
    assert_eq!(parse_page_number(Some("2")), Some(2));
    assert_eq!(parse_page_number(Some(" 3 ")), Some(3));
    assert_eq!(parse_page_number(Some("2.0")), None);
    assert_eq!(parse_page_number(Some("1e1")), None);
    assert_eq!(parse_page_number(Some("2.5")), None);
    assert_eq!(parse_page_number(Some("inf")), None);
    assert_eq!(parse_page_number(None), None);
}

#[test]
fn float_spellings_serve_first_page() {
    let items = items(13);
    for raw in ["2.0", "1e1"] {
        let page = paginate(&items, POSTS_PER_PAGE, Some(raw));
        assert_eq!(page.number, 1, "requested {:?}", raw);
        assert_eq!(page.len(), 10);
    }
}

#[test]
fn window_offsets_match_page_number() {
    let window = PageWindow::resolve(35, 10, Some("4"));
    assert_eq!(window.number, 4);
    assert_eq!(window.num_pages, 4);
    assert_eq!(window.offset(), 30);
    assert_eq!(window.limit(), 10);
    assert!(!window.has_next());
    assert!(window.has_previous());
}
