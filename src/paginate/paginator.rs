//! # Paginator
//!
//! Page arithmetic over a known item count. With `orphans > 0` a final
//! page that would hold `orphans` items or fewer is merged into the page
//! before it.

use std::ops::{Range, RangeInclusive};

use crate::store::{DocumentStore, Query};

use super::errors::{PageError, PageResult};

/// Anything that can report how many items it holds
pub trait ItemCount {
    fn item_count(&self) -> PageResult<usize>;
}

impl<T> ItemCount for [T] {
    fn item_count(&self) -> PageResult<usize> {
        Ok(self.len())
    }
}

impl<T> ItemCount for Vec<T> {
    fn item_count(&self) -> PageResult<usize> {
        Ok(self.len())
    }
}

/// Item count of a store query
pub struct StoreCount<'a> {
    store: &'a dyn DocumentStore,
    query: &'a Query,
}

impl<'a> StoreCount<'a> {
    pub fn new(store: &'a dyn DocumentStore, query: &'a Query) -> Self {
        Self { store, query }
    }
}

impl ItemCount for StoreCount<'_> {
    fn item_count(&self) -> PageResult<usize> {
        Ok(self.store.count(self.query, None)?)
    }
}

/// Page arithmetic for one collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    count: usize,
    per_page: usize,
    orphans: usize,
    allow_empty_first_page: bool,
}

impl Paginator {
    pub fn new(count: usize, per_page: usize) -> PageResult<Self> {
        if per_page == 0 {
            return Err(PageError::ZeroPerPage);
        }
        Ok(Self {
            count,
            per_page,
            orphans: 0,
            allow_empty_first_page: true,
        })
    }

    /// Count `source` once and paginate it
    pub fn from_source<S: ItemCount + ?Sized>(source: &S, per_page: usize) -> PageResult<Self> {
        Self::new(source.item_count()?, per_page)
    }

    pub fn with_orphans(mut self, orphans: usize) -> Self {
        self.orphans = orphans;
        self
    }

    pub fn with_allow_empty_first_page(mut self, allow: bool) -> Self {
        self.allow_empty_first_page = allow;
        self
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    /// Total pages; zero for an empty collection
    pub fn num_pages(&self) -> usize {
        if self.count == 0 {
            return 0;
        }
        let hits = self.count.saturating_sub(self.orphans).max(1);
        hits.div_ceil(self.per_page)
    }

    /// 1-based page numbers
    pub fn page_range(&self) -> RangeInclusive<usize> {
        1..=self.num_pages()
    }

    /// Parse a raw page parameter
    pub fn parse_number(raw: &str) -> PageResult<i64> {
        raw.trim()
            .parse::<i64>()
            .map_err(|_| PageError::NotAnInteger(raw.to_string()))
    }

    /// Check a page number against the page count
    ///
    /// Page 1 of an empty collection is valid while empty first pages are
    /// allowed.
    pub fn validate_number(&self, number: i64) -> PageResult<usize> {
        let Ok(n) = usize::try_from(number) else {
            return Err(PageError::EmptyPage(number));
        };
        if n < 1 {
            return Err(PageError::EmptyPage(number));
        }
        if n > self.num_pages() && !(n == 1 && self.allow_empty_first_page) {
            return Err(PageError::EmptyPage(number));
        }
        Ok(n)
    }

    /// The given page, or an error if it does not exist
    pub fn page(&self, number: i64) -> PageResult<Page> {
        let number = self.validate_number(number)?;
        let bottom = (number - 1) * self.per_page;
        let mut top = bottom + self.per_page;
        if top + self.orphans >= self.count {
            top = self.count;
        }
        Ok(Page {
            number,
            range: bottom.min(top)..top,
            paginator: *self,
        })
    }

    /// The requested page, falling back to a valid one
    ///
    /// A missing, non-integer or sub-1 page resolves to page 1; a page past
    /// the end resolves to the last page.
    pub fn resolve(&self, raw: Option<&str>) -> PageResult<Page> {
        let requested = match raw.map(Self::parse_number) {
            Some(Ok(n)) => n,
            Some(Err(_)) | None => 1,
        };
        match self.page(requested) {
            Ok(page) => Ok(page),
            Err(PageError::EmptyPage(n)) if n < 1 => self.page(1),
            Err(PageError::EmptyPage(_)) => self.page(self.num_pages().max(1) as i64),
            Err(e) => Err(e),
        }
    }
}

/// Entry in a page navigation window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLink {
    Number(usize),
    /// Elided run of pages
    Gap,
}

/// One page of a paginated collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    number: usize,
    range: Range<usize>,
    paginator: Paginator,
}

impl Page {
    pub fn number(&self) -> usize {
        self.number
    }

    /// Half-open index range of this page's items
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    pub fn offset(&self) -> usize {
        self.range.start
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    /// This page's items out of the full sequence
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let end = self.range.end.min(items.len());
        &items[self.range.start.min(end)..end]
    }

    pub fn has_next(&self) -> bool {
        self.number < self.paginator.num_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_other_pages(&self) -> bool {
        self.has_previous() || self.has_next()
    }

    pub fn next_page_number(&self) -> Option<usize> {
        self.has_next().then_some(self.number + 1)
    }

    pub fn previous_page_number(&self) -> Option<usize> {
        self.has_previous().then_some(self.number - 1)
    }

    /// 1-based index of the first item, 0 when the collection is empty
    pub fn start_index(&self) -> usize {
        if self.paginator.count == 0 {
            return 0;
        }
        self.range.start + 1
    }

    /// 1-based index of the last item
    pub fn end_index(&self) -> usize {
        self.range.end
    }

    /// Page numbers within `padding` of this page, with gaps marking
    /// pages cut off before the first or after the last
    pub fn window(&self, padding: usize) -> Vec<PageLink> {
        let num_pages = self.paginator.num_pages();
        if num_pages == 0 {
            return Vec::new();
        }
        let first = self.number.saturating_sub(padding).max(1);
        let last = (self.number + padding).min(num_pages);

        let mut links = Vec::with_capacity(last + 3 - first);
        if first > 1 {
            links.push(PageLink::Gap);
        }
        links.extend((first..=last).map(PageLink::Number));
        if last < num_pages {
            links.push(PageLink::Gap);
        }
        links
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count_matches_ceiling() {
        for n in 0..40usize {
            for p in 1..7usize {
                let paginator = Paginator::new(n, p).unwrap();
                assert_eq!(paginator.num_pages(), n.div_ceil(p), "n={} p={}", n, p);
            }
        }
    }

    #[test]
    fn test_page_ranges() {
        let paginator = Paginator::new(45, 20).unwrap();
        assert_eq!(paginator.page(1).unwrap().range(), 0..20);
        assert_eq!(paginator.page(3).unwrap().range(), 40..45);
        assert!(matches!(paginator.page(4), Err(PageError::EmptyPage(4))));
        assert!(matches!(paginator.page(0), Err(PageError::EmptyPage(0))));
    }

    #[test]
    fn test_orphans_merge_small_last_page() {
        let paginator = Paginator::new(23, 10).unwrap().with_orphans(3);
        assert_eq!(paginator.num_pages(), 2);
        assert_eq!(paginator.page(2).unwrap().range(), 10..23);
    }

    #[test]
    fn test_resolve_falls_back() {
        let paginator = Paginator::new(45, 20).unwrap();
        assert_eq!(paginator.resolve(None).unwrap().number(), 1);
        assert_eq!(paginator.resolve(Some("abc")).unwrap().number(), 1);
        assert_eq!(paginator.resolve(Some("0")).unwrap().number(), 1);
        assert_eq!(paginator.resolve(Some("-4")).unwrap().number(), 1);
        assert_eq!(paginator.resolve(Some("99")).unwrap().number(), 3);
        assert_eq!(paginator.resolve(Some("2")).unwrap().number(), 2);
    }

    #[test]
    fn test_empty_collection_serves_first_page() {
        let paginator = Paginator::new(0, 20).unwrap();
        assert_eq!(paginator.num_pages(), 0);
        let page = paginator.resolve(Some("5")).unwrap();
        assert_eq!(page.number(), 1);
        assert!(page.is_empty());
        assert_eq!(page.start_index(), 0);
        assert_eq!(page.end_index(), 0);
        assert!(!page.has_other_pages());

        let strict = paginator.with_allow_empty_first_page(false);
        assert!(strict.resolve(None).is_err());
    }

    #[test]
    fn test_page_navigation() {
        let paginator = Paginator::new(50, 10).unwrap();
        let page = paginator.page(3).unwrap();
        assert_eq!(page.next_page_number(), Some(4));
        assert_eq!(page.previous_page_number(), Some(2));
        assert_eq!(page.start_index(), 21);
        assert_eq!(page.end_index(), 30);

        let last = paginator.page(5).unwrap();
        assert!(!last.has_next());
        assert_eq!(last.next_page_number(), None);
        assert!(last.has_other_pages());
    }

    #[test]
    fn test_window_marks_gaps() {
        let paginator = Paginator::new(200, 10).unwrap();
        let page = paginator.page(10).unwrap();
        let window = page.window(2);
        assert_eq!(window.first(), Some(&PageLink::Gap));
        assert_eq!(window.last(), Some(&PageLink::Gap));
        assert_eq!(window[1], PageLink::Number(8));
        assert_eq!(window[5], PageLink::Number(12));

        let start = paginator.page(1).unwrap().window(2);
        assert_eq!(
            start,
            vec![
                PageLink::Number(1),
                PageLink::Number(2),
                PageLink::Number(3),
                PageLink::Gap
            ]
        );
    }

    #[test]
    fn test_slice_and_sources() {
        let items: Vec<u32> = (0..7).collect();
        let paginator = Paginator::from_source(&items, 3).unwrap();
        assert_eq!(paginator.page(3).unwrap().slice(&items), &[6]);
        assert!(matches!(Paginator::new(5, 0), Err(PageError::ZeroPerPage)));
    }
}
