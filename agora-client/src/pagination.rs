//! Pagination arithmetic and the list view state machine.

use agora_core::{PostPage, ReportPage, UserPage};
use agora_query::CacheEntry;

/// `ceil(total_count / page_size)`; zero when either is zero.
pub fn total_pages(total_count: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    let pages = total_count.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// One button in the page selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page { number: u32, current: bool },
    Ellipsis,
}

/// Page buttons for a selector `width` pages wide, sliding around `current`.
/// The first and last page are always present, with an ellipsis where the
/// window does not reach them.
pub fn page_window(current: u32, total: u32, width: u32) -> Vec<PageItem> {
    let page = |number: u32| PageItem::Page {
        number,
        current: number == current,
    };
    if total == 0 {
        return Vec::new();
    }
    let width = width.max(1);
    if total <= width {
        return (1..=total).map(page).collect();
    }

    let current = current.clamp(1, total);
    let half = width / 2;
    let mut start = current.saturating_sub(half).max(1);
    let mut end = start + width - 1;
    if end > total {
        end = total;
        start = total + 1 - width;
    }

    let mut items = Vec::with_capacity(width as usize + 4);
    if start > 1 {
        items.push(page(1));
        if start > 2 {
            items.push(PageItem::Ellipsis);
        }
    }
    items.extend((start..=end).map(page));
    if end < total {
        if end < total - 1 {
            items.push(PageItem::Ellipsis);
        }
        items.push(page(total));
    }
    items
}

/// Current position in a sorted, paginated list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager<S> {
    sort: S,
    page: u32,
    page_size: u32,
}

impl<S: Copy + PartialEq> Pager<S> {
    pub fn new(sort: S, page_size: u32) -> Self {
        Self {
            sort,
            page: 1,
            page_size,
        }
    }

    pub fn sort(&self) -> S {
        self.sort
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Changing the sort order always returns to the first page.
    pub fn set_sort(&mut self, sort: S) {
        if self.sort != sort {
            self.sort = sort;
            self.page = 1;
        }
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    pub fn next(&mut self, total_pages: u32) {
        if self.page < total_pages {
            self.page += 1;
        }
    }

    pub fn previous(&mut self) {
        if self.page > 1 {
            self.page -= 1;
        }
    }
}

/// A paged server response.
pub trait Paged {
    type Item: Clone;

    fn items(&self) -> &[Self::Item];
    fn total_count(&self) -> u64;
}

impl Paged for PostPage {
    type Item = agora_core::Post;

    fn items(&self) -> &[Self::Item] {
        &self.posts
    }

    fn total_count(&self) -> u64 {
        self.total_count
    }
}

impl Paged for UserPage {
    type Item = agora_core::UserProfile;

    fn items(&self) -> &[Self::Item] {
        &self.users
    }

    fn total_count(&self) -> u64 {
        self.total_count
    }
}

impl Paged for ReportPage {
    type Item = agora_core::Report;

    fn items(&self) -> &[Self::Item] {
        &self.reports
    }

    fn total_count(&self) -> u64 {
        self.total_count
    }
}

/// What a paginated list view shows.
#[derive(Debug, Clone, PartialEq)]
pub enum ListState<T> {
    Loading,
    /// The read failed; show the message with a retry affordance.
    Failed { message: String },
    Empty,
    /// The requested page lies past the end of a non-empty list.
    NoMorePages { total_pages: u32 },
    Page {
        items: Vec<T>,
        page: u32,
        total_pages: u32,
        window: Vec<PageItem>,
    },
}

impl<T> ListState<T> {
    pub fn items(&self) -> &[T] {
        match self {
            ListState::Page { items, .. } => items,
            _ => &[],
        }
    }

    pub fn total_pages(&self) -> u32 {
        match self {
            ListState::Page { total_pages, .. } | ListState::NoMorePages { total_pages } => {
                *total_pages
            }
            _ => 0,
        }
    }
}

/// Map one page of results onto a list state.
pub fn page_state<P: Paged>(page: &P, current: u32, page_size: u32, width: u32) -> ListState<P::Item> {
    let pages = total_pages(page.total_count(), page_size);
    if page.total_count() == 0 && page.items().is_empty() {
        return ListState::Empty;
    }
    if current > pages || page.items().is_empty() {
        return ListState::NoMorePages { total_pages: pages };
    }
    ListState::Page {
        items: page.items().to_vec(),
        page: current,
        total_pages: pages,
        window: page_window(current, pages, width),
    }
}

/// Map a cache entry for a paged read onto a list state. Cached data wins
/// over an error so a failed refetch keeps showing the last good page.
pub fn list_state<P: Paged>(
    entry: &CacheEntry<P>,
    current: u32,
    page_size: u32,
    width: u32,
    fallback: &str,
) -> ListState<P::Item> {
    match (entry.data(), &entry.error) {
        (Some(data), _) => page_state(data, current, page_size, width),
        (None, Some(err)) => ListState::Failed {
            message: err.user_message(fallback),
        },
        (None, None) => ListState::Loading,
    }
}

/// Slice a fully-loaded list for client-side pagination.
pub fn local_page<T: Clone>(items: &[T], current: u32, page_size: u32, width: u32) -> ListState<T> {
    let page = LocalPage {
        items: paginate_slice(items, current, page_size),
        total_count: items.len() as u64,
    };
    page_state(&page, current, page_size, width)
}

fn paginate_slice<T: Clone>(items: &[T], current: u32, page_size: u32) -> Vec<T> {
    let size = page_size as usize;
    let start = (current.max(1) as usize - 1).saturating_mul(size);
    items.iter().skip(start).take(size).cloned().collect()
}

struct LocalPage<T> {
    items: Vec<T>,
    total_count: u64,
}

impl<T: Clone> Paged for LocalPage<T> {
    type Item = T;

    fn items(&self) -> &[T] {
        &self.items
    }

    fn total_count(&self) -> u64 {
        self.total_count
    }
}
