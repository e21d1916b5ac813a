use serde::{Deserialize, Serialize};

/// Canonical list view model, whatever shape the server answered with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ListResult<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> Default for ListResult<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> ListResult<T> {
    pub fn new(items: Vec<T>, total: u64) -> Self {
        Self { items, total }
    }

    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of pages for the given page size; never less than one.
    pub fn total_pages(&self, page_size: u32) -> u32 {
        total_pages(self.total, page_size)
    }

    /// Map items while keeping `total` (wire type -> view type).
    pub fn map_items<U>(self, f: impl FnMut(T) -> U) -> ListResult<U> {
        ListResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}

/// `max(1, ceil(total / page_size))`. A zero page size counts as one page.
pub fn total_pages(total: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 1;
    }
    let pages = total.div_ceil(u64::from(page_size)).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Compact page list for pagination controls, e.g. `1 2 … 7 8 [9] 10 11 … 20`.
/// `None` marks a gap.
pub fn page_window(
    total_pages: u32,
    current: u32,
    edge: u32,
    around_before: u32,
    around_after: u32,
) -> Vec<Option<u32>> {
    if total_pages == 0 {
        return Vec::new();
    }
    // u64 so `last + 1` cannot overflow at u32::MAX pages
    let last = u64::from(total_pages);
    let current = u64::from(current).clamp(1, last);
    let (edge, before, after) = (u64::from(edge), u64::from(around_before), u64::from(around_after));
    let mut pages = Vec::new();
    fn push(range: std::ops::Range<u64>, pages: &mut Vec<Option<u32>>) {
        pages.extend(range.filter_map(|p| u32::try_from(p).ok()).map(Some));
    }

    let left_end = (1 + edge).min(last + 1);
    push(1..left_end, &mut pages);

    let mid_start = left_end.max(current.saturating_sub(before));
    let mid_end = (current + after + 1).min(last + 1);
    if mid_start > left_end {
        pages.push(None);
    }
    push(mid_start..mid_end, &mut pages);

    let right_start = mid_end.max(last.saturating_sub(edge) + 1);
    if right_start > mid_end {
        pages.push(None);
    }
    push(right_start..last + 1, &mut pages);

    pages
}
