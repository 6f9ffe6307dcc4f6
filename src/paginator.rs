use std::ops::Range;

/// One page of a view: which rows to show and where navigation stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Current page, always within `1..=max(1, total_pages)`.
    pub number: usize,
    /// Zero when the view is empty.
    pub total_pages: usize,
    pub start: usize,
    pub end: usize,
}

impl Page {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn slice<'a, T>(&self, view: &'a [T]) -> &'a [T] {
        &view[self.range()]
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.total_pages > 0 && self.number < self.total_pages
    }

    pub fn label(&self) -> String {
        format!("Page {} of {}", self.number, self.total_pages)
    }
}

pub fn total_pages(len: usize, page_size: usize) -> usize {
    len.div_ceil(page_size.max(1))
}

pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

/// Slice bounds for `page` of a view with `len` rows. The reported number is
/// clamped; the bounds for a page past the end are empty.
pub fn paginate(len: usize, page: usize, page_size: usize) -> Page {
    let page_size = page_size.max(1);
    let total = total_pages(len, page_size);
    let start = (page.max(1) - 1).saturating_mul(page_size).min(len);
    let end = start.saturating_add(page_size).min(len);
    Page {
        number: clamp_page(page, total),
        total_pages: total,
        start,
        end,
    }
}
