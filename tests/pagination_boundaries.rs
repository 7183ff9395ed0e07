//! Pagination Boundary Tests
//!
//! - `pagecount == ceil(N / P)`, zero for an empty collection
//! - out-of-range requests resolve to page 1 or the last page
//! - store-backed and in-memory sources paginate identically

use gantry::paginate::{Paginator, StoreCount};
use gantry::store::{DocumentStore, Entity, FilterOp, MemoryStore, Query};

fn store_with(n: i64) -> MemoryStore {
    let store = MemoryStore::new();
    for i in 0..n {
        store.put(Entity::new("Row").with("i", i)).unwrap();
    }
    store
}

#[test]
fn test_page_count_is_ceiling() {
    for n in [0usize, 1, 9, 10, 11, 99, 100] {
        for per_page in [1usize, 3, 10, 100] {
            let paginator = Paginator::new(n, per_page).unwrap();
            assert_eq!(paginator.num_pages(), n.div_ceil(per_page), "n={} p={}", n, per_page);
        }
    }
}

#[test]
fn test_resolve_clamps_to_boundaries() {
    let paginator = Paginator::new(23, 5).unwrap();
    let first = paginator.page(1).unwrap();
    let last = paginator.page(5).unwrap();

    for raw in ["0", "-1", "x", ""] {
        assert_eq!(paginator.resolve(Some(raw)).unwrap().range(), first.range(), "{:?}", raw);
    }
    assert_eq!(paginator.resolve(None).unwrap().range(), first.range());
    for raw in ["6", "1000"] {
        assert_eq!(paginator.resolve(Some(raw)).unwrap().range(), last.range(), "{:?}", raw);
    }
    assert_eq!(last.range(), 20..23);
    assert_eq!((last.start_index(), last.end_index()), (21, 23));
}

#[test]
fn test_store_and_items_agree() {
    let store = store_with(17);
    let query = Query::new("Row").filter("i", FilterOp::Gte, 2i64).order("i");
    let rows = store.fetch(&query, 0, None).unwrap();

    let counted = Paginator::from_source(&StoreCount::new(&store, &query), 4).unwrap();
    let listed = Paginator::from_source(rows.as_slice(), 4).unwrap();
    assert_eq!(counted.count(), 15);
    assert_eq!(counted.num_pages(), listed.num_pages());

    for number in counted.page_range() {
        let page = counted.page(number as i64).unwrap();
        let fetched = store.fetch(&query, page.offset(), Some(page.len())).unwrap();
        assert_eq!(fetched.as_slice(), listed.page(number as i64).unwrap().slice(&rows));
    }
}

#[test]
fn test_empty_source_serves_empty_first_page() {
    let store = store_with(0);
    let query = Query::new("Row");
    let paginator = Paginator::from_source(&StoreCount::new(&store, &query), 10).unwrap();
    assert_eq!(paginator.num_pages(), 0);

    let page = paginator.resolve(Some("4")).unwrap();
    assert_eq!(page.number(), 1);
    assert!(page.is_empty());
    assert!(!page.has_next());
    assert!(!page.has_previous());
}
