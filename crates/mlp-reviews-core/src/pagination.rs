//! Fixed-size page slicing and page-control metadata.
//!
//! Page numbers are 1-indexed and always clamped into `[1, total_pages]`;
//! an empty result set still has one page.

use serde::Serialize;

/// Default number of reviews per page.
pub const DEFAULT_PAGE_SIZE: usize = 6;

/// Pages shown on either side of the current page in [`page_window`].
const WINDOW_DELTA: usize = 2;

/// `ceil(len / page_size)`, at least 1.
pub fn total_pages(len: usize, page_size: usize) -> usize {
    let page_size = page_size.max(1);
    len.div_ceil(page_size).max(1)
}

pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

/// One page of an ordered result set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// The clamped page actually returned.
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_items: usize,
    /// 1-indexed position of the first item, 0 when the page is empty.
    pub start_item: usize,
    /// 1-indexed position of the last item, 0 when the page is empty.
    pub end_item: usize,
}

/// Slice `results` to page `page_number`.
///
/// Out-of-range page numbers are clamped rather than rejected.
pub fn paginate<T: Clone>(results: &[T], page_size: usize, page_number: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total = total_pages(results.len(), page_size);
    let page = clamp_page(page_number, total);

    let start = ((page - 1) * page_size).min(results.len());
    let end = (page * page_size).min(results.len());
    let items = results[start..end].to_vec();

    let (start_item, end_item) = if items.is_empty() {
        (0, 0)
    } else {
        (start + 1, end)
    };

    Page {
        items,
        page,
        page_size,
        total_pages: total,
        total_items: results.len(),
        start_item,
        end_item,
    }
}

/// Entry in the page-control strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "page")]
pub enum PageLink {
    Page(usize),
    Gap,
}

/// First page, last page, and ±2 around the current page, with gaps.
pub fn page_window(current: usize, total_pages: usize) -> Vec<PageLink> {
    let total = total_pages.max(1);
    let current = clamp_page(current, total);

    let mut links = vec![PageLink::Page(1)];
    if total == 1 {
        return links;
    }

    let lo = current.saturating_sub(WINDOW_DELTA).max(2);
    let hi = (current + WINDOW_DELTA).min(total - 1);

    if lo > 2 {
        links.push(PageLink::Gap);
    }
    for page in lo..=hi {
        links.push(PageLink::Page(page));
    }
    if hi < total - 1 {
        links.push(PageLink::Gap);
    }
    links.push(PageLink::Page(total));

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 6), 1);
        assert_eq!(total_pages(1, 6), 1);
        assert_eq!(total_pages(6, 6), 1);
        assert_eq!(total_pages(7, 6), 2);
        assert_eq!(total_pages(13, 6), 3);
        assert_eq!(total_pages(5, 0), 5);
    }

    #[test]
    fn test_slices() {
        let items: Vec<u32> = (1..=13).collect();
        let p2 = paginate(&items, 6, 2);
        assert_eq!(p2.items, vec![7, 8, 9, 10, 11, 12]);
        assert_eq!((p2.start_item, p2.end_item), (7, 12));

        let p3 = paginate(&items, 6, 3);
        assert_eq!(p3.items, vec![13]);
    }

    #[test]
    fn test_page_beyond_total_clamps_to_last() {
        let items: Vec<u32> = (1..=13).collect();
        let last = paginate(&items, 6, 3);
        let beyond = paginate(&items, 6, 3 + 5);
        assert_eq!(beyond.items, last.items);
        assert_eq!(beyond.page, 3);
    }

    #[test]
    fn test_page_zero_clamps_to_first() {
        let items: Vec<u32> = (1..=13).collect();
        assert_eq!(paginate(&items, 6, 0).page, 1);
    }

    #[test]
    fn test_empty_is_page_one_of_one() {
        let p = paginate::<u32>(&[], 6, 4);
        assert_eq!((p.page, p.total_pages), (1, 1));
        assert!(p.items.is_empty());
        assert_eq!((p.start_item, p.end_item), (0, 0));
    }

    #[test]
    fn test_window_small() {
        assert_eq!(page_window(1, 1), vec![PageLink::Page(1)]);
        assert_eq!(
            page_window(1, 3),
            vec![PageLink::Page(1), PageLink::Page(2), PageLink::Page(3)]
        );
    }

    #[test]
    fn test_window_with_gaps() {
        use PageLink::*;
        assert_eq!(
            page_window(6, 12),
            vec![Page(1), Gap, Page(4), Page(5), Page(6), Page(7), Page(8), Gap, Page(12)]
        );
        assert_eq!(page_window(1, 12), vec![Page(1), Page(2), Page(3), Gap, Page(12)]);
        assert_eq!(page_window(12, 12), vec![Page(1), Gap, Page(10), Page(11), Page(12)]);
    }

    #[test]
    fn test_window_always_reaches_first_last_current() {
        for total in 1..=15 {
            for current in 1..=total {
                let window = page_window(current, total);
                for must in [1, total, current] {
                    assert!(window.contains(&PageLink::Page(must)), "{} of {}", current, total);
                }
            }
        }
    }
}
