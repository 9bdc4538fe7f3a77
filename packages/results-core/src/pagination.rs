//! Windowed, navigable view over an ordered collection.

use std::ops::Range;

use serde::{Serialize, Serializer};

/// Position and size of a page over `total_items`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    current_page: usize,
    items_per_page: usize,
    total_items: usize,
}

impl PageWindow {
    /// `items_per_page` of zero is treated as one.
    pub fn new(total_items: usize, items_per_page: usize) -> Self {
        Self {
            current_page: 1,
            items_per_page: items_per_page.max(1),
            total_items,
        }
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn items_per_page(&self) -> usize {
        self.items_per_page
    }

    pub fn total_items(&self) -> usize {
        self.total_items
    }

    /// Zero for an empty collection.
    pub fn total_pages(&self) -> usize {
        self.total_items.div_ceil(self.items_per_page)
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    /// Index range of the current page, clamped to the collection.
    pub fn range(&self) -> Range<usize> {
        let start = ((self.current_page - 1) * self.items_per_page).min(self.total_items);
        let end = (start + self.items_per_page).min(self.total_items);
        start..end
    }

    /// Move to page `n`. Out-of-range requests leave the window unchanged.
    pub fn go_to_page(&mut self, n: usize) -> bool {
        if n < 1 || n > self.total_pages() || n == self.current_page {
            return false;
        }
        self.current_page = n;
        true
    }

    /// Change the collection size. Any change of length goes back to page 1.
    pub fn resize(&mut self, total_items: usize) -> bool {
        if total_items == self.total_items {
            return false;
        }
        self.total_items = total_items;
        self.current_page = 1;
        true
    }
}

/// One page of an ordered collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    pub current_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<'a, T> Page<'a, T> {
    fn from_window(items: &'a [T], window: &PageWindow) -> Self {
        Self {
            items: &items[window.range()],
            current_page: window.current_page(),
            total_pages: window.total_pages(),
            total_items: window.total_items(),
            has_next: window.has_next(),
            has_previous: window.has_previous(),
        }
    }
}

/// The first page of `items`.
pub fn paginate<T>(items: &[T], items_per_page: usize) -> Page<'_, T> {
    Page::from_window(items, &PageWindow::new(items.len(), items_per_page))
}

/// Page `page` of `items`, or the first page if `page` does not exist.
pub fn paginate_at<T>(items: &[T], items_per_page: usize, page: usize) -> Page<'_, T> {
    let mut window = PageWindow::new(items.len(), items_per_page);
    window.go_to_page(page);
    Page::from_window(items, &window)
}

/// Stateful page navigation over an owned collection.
#[derive(Debug, Clone)]
pub struct Paginator<T> {
    items: Vec<T>,
    window: PageWindow,
}

impl<T> Paginator<T> {
    pub fn new(items: Vec<T>, items_per_page: usize) -> Self {
        let window = PageWindow::new(items.len(), items_per_page);
        Self { items, window }
    }

    pub fn window(&self) -> &PageWindow {
        &self.window
    }

    pub fn page(&self) -> Page<'_, T> {
        Page::from_window(&self.items, &self.window)
    }

    /// Returns whether the current page changed.
    pub fn go_to_page(&mut self, n: usize) -> bool {
        self.window.go_to_page(n)
    }

    pub fn next(&mut self) -> bool {
        self.window.go_to_page(self.window.current_page() + 1)
    }

    pub fn previous(&mut self) -> bool {
        self.window.go_to_page(self.window.current_page().saturating_sub(1))
    }

    /// Replace the backing collection. The page is kept when the length is
    /// unchanged and reset to 1 otherwise.
    pub fn set_items(&mut self, items: Vec<T>) {
        self.window.resize(items.len());
        self.items = items;
    }

    pub fn page_numbers(&self) -> Vec<PageMarker> {
        page_numbers(self.window.current_page(), self.window.total_pages())
    }
}

/// An element of a condensed page-number bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMarker {
    Page(usize),
    Ellipsis,
}

impl Serialize for PageMarker {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Page(n) => serializer.serialize_u64(*n as u64),
            Self::Ellipsis => serializer.serialize_str("ellipsis"),
        }
    }
}

/// Page numbers to display for `current` out of `total` pages.
///
/// Up to five pages are listed in full. Beyond that the first and last page
/// are always shown, with an ellipsis marking each elided run.
pub fn page_numbers(current: usize, total: usize) -> Vec<PageMarker> {
    use PageMarker::{Ellipsis, Page};

    if total <= 5 {
        return (1..=total).map(Page).collect();
    }

    if current <= 3 {
        let mut pages: Vec<_> = (1..=4).map(Page).collect();
        pages.extend([Ellipsis, Page(total)]);
        pages
    } else if current >= total - 2 {
        let mut pages = vec![Page(1), Ellipsis];
        pages.extend((total - 3..=total).map(Page));
        pages
    } else {
        vec![
            Page(1),
            Ellipsis,
            Page(current - 1),
            Page(current),
            Page(current + 1),
            Ellipsis,
            Page(total),
        ]
    }
}
