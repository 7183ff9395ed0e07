//! # In-Memory Document Store
//!
//! A [`DocumentStore`] over a single `RwLock`ed map. Transactions hold the
//! write lock for their whole body and buffer writes until commit, which
//! gives the same all-or-nothing behaviour as a real backend.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

use super::backend::{DocumentStore, Transaction, TransactionFn};
use super::entity::Entity;
use super::errors::{StoreError, StoreResult};
use super::key::Key;
use super::query::{Cursor, Query};

type EntityMap = BTreeMap<Key, Entity>;

/// In-memory document store
#[derive(Debug)]
pub struct MemoryStore {
    entities: RwLock<EntityMap>,
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entities: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Number of stored entities across all kinds
    pub fn len(&self) -> usize {
        self.entities.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn allocate(next_id: &AtomicI64, entity: &mut Entity) -> Key {
        match entity.key() {
            Some(key) => key.clone(),
            None => {
                let key = Key::with_id(entity.kind(), next_id.fetch_add(1, Ordering::SeqCst));
                entity.set_key(key.clone());
                key
            }
        }
    }

    /// Matching entities in query order; ties break on key
    fn scan(map: &EntityMap, query: &Query) -> Vec<Entity> {
        let mut matched: Vec<&Entity> = map.values().filter(|e| query.matches(e)).collect();
        matched.sort_by(|a, b| query.compare(a, b).then_with(|| a.key().cmp(&b.key())));
        matched.into_iter().cloned().collect()
    }

    fn encode_cursor(position: usize) -> Cursor {
        Cursor::new(URL_SAFE_NO_PAD.encode(format!("pos:{}", position)))
    }

    fn decode_cursor(cursor: &Cursor) -> StoreResult<usize> {
        let invalid = || StoreError::InvalidCursor(cursor.as_str().to_string());
        let bytes = URL_SAFE_NO_PAD.decode(cursor.as_str()).map_err(|_| invalid())?;
        let raw = String::from_utf8(bytes).map_err(|_| invalid())?;
        raw.strip_prefix("pos:")
            .and_then(|p| p.parse().ok())
            .ok_or_else(invalid)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Transaction over a write-locked map
struct MemoryTransaction<'a> {
    base: &'a EntityMap,
    writes: BTreeMap<Key, Option<Entity>>,
    next_id: &'a AtomicI64,
}

impl Transaction for MemoryTransaction<'_> {
    fn get(&mut self, key: &Key) -> StoreResult<Option<Entity>> {
        match self.writes.get(key) {
            Some(staged) => Ok(staged.clone()),
            None => Ok(self.base.get(key).cloned()),
        }
    }

    fn put(&mut self, mut entity: Entity) -> StoreResult<Key> {
        let key = MemoryStore::allocate(self.next_id, &mut entity);
        self.writes.insert(key.clone(), Some(entity));
        Ok(key)
    }

    fn delete(&mut self, key: &Key) -> StoreResult<bool> {
        let existed = self.get(key)?.is_some();
        self.writes.insert(key.clone(), None);
        Ok(existed)
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, key: &Key) -> StoreResult<Option<Entity>> {
        let map = self.entities.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(map.get(key).cloned())
    }

    fn put(&self, mut entity: Entity) -> StoreResult<Key> {
        let key = Self::allocate(&self.next_id, &mut entity);
        let mut map = self.entities.write().map_err(|_| StoreError::LockPoisoned)?;
        map.insert(key.clone(), entity);
        Ok(key)
    }

    fn delete(&self, key: &Key) -> StoreResult<bool> {
        let mut map = self.entities.write().map_err(|_| StoreError::LockPoisoned)?;
        Ok(map.remove(key).is_some())
    }

    fn run_in_transaction(&self, body: &mut TransactionFn<'_>) -> StoreResult<()> {
        let mut map = self.entities.write().map_err(|_| StoreError::LockPoisoned)?;

        let writes = {
            let mut txn = MemoryTransaction {
                base: &map,
                writes: BTreeMap::new(),
                next_id: &self.next_id,
            };
            body(&mut txn)?;
            txn.writes
        };

        for (key, staged) in writes {
            match staged {
                Some(entity) => {
                    map.insert(key, entity);
                }
                None => {
                    map.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn count(&self, query: &Query, limit: Option<usize>) -> StoreResult<usize> {
        let map = self.entities.read().map_err(|_| StoreError::LockPoisoned)?;
        let total = map.values().filter(|e| query.matches(e)).count();
        Ok(limit.map_or(total, |l| total.min(l)))
    }

    fn fetch(&self, query: &Query, offset: usize, limit: Option<usize>) -> StoreResult<Vec<Entity>> {
        let map = self.entities.read().map_err(|_| StoreError::LockPoisoned)?;
        let rows = Self::scan(&map, query).into_iter().skip(offset);
        Ok(match limit {
            Some(limit) => rows.take(limit).collect(),
            None => rows.collect(),
        })
    }

    fn fetch_page(
        &self,
        query: &Query,
        cursor: Option<&Cursor>,
        limit: usize,
    ) -> StoreResult<(Vec<Entity>, Option<Cursor>)> {
        let start = cursor.map(Self::decode_cursor).transpose()?.unwrap_or(0);

        let map = self.entities.read().map_err(|_| StoreError::LockPoisoned)?;
        let rows = Self::scan(&map, query);
        let end = start.saturating_add(limit).min(rows.len());
        let page = rows.get(start..end).map(<[Entity]>::to_vec).unwrap_or_default();

        let next = (end < rows.len()).then(|| Self::encode_cursor(end));
        Ok((page, next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{transact, FilterOp, Value};

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        for n in [5i64, 1, 4, 2, 3] {
            store.put(Entity::new("Num").with("n", n)).unwrap();
        }
        store.put(Entity::new("Other").with("n", 100i64)).unwrap();
        store
    }

    fn numbers(entities: &[Entity]) -> Vec<i64> {
        entities
            .iter()
            .filter_map(|e| e.get("n").and_then(Value::as_i64))
            .collect()
    }

    #[test]
    fn test_put_allocates_key() {
        let store = MemoryStore::new();
        let key = store.put(Entity::new("Post").with("t", "x")).unwrap();
        assert_eq!(key.kind(), "Post");
        let loaded = store.get(&key).unwrap().unwrap();
        assert_eq!(loaded.key(), Some(&key));
        assert_eq!(loaded.get("t"), Some(&Value::from("x")));
    }

    #[test]
    fn test_delete_reports_existence() {
        let store = MemoryStore::new();
        let key = store.put(Entity::new("Post")).unwrap();
        assert!(store.delete(&key).unwrap());
        assert!(!store.delete(&key).unwrap());
        assert!(store.get(&key).unwrap().is_none());
    }

    #[test]
    fn test_fetch_filters_and_orders() {
        let store = seeded();
        let query = Query::new("Num").filter("n", FilterOp::Gte, 2i64).order("-n");
        let rows = store.fetch(&query, 0, None).unwrap();
        assert_eq!(numbers(&rows), vec![5, 4, 3, 2]);
        assert_eq!(store.count(&query, None).unwrap(), 4);
        assert_eq!(store.count(&query, Some(2)).unwrap(), 2);

        let rows = store.fetch(&query, 1, Some(2)).unwrap();
        assert_eq!(numbers(&rows), vec![4, 3]);
    }

    #[test]
    fn test_fetch_page_walks_cursor() {
        let store = seeded();
        let query = Query::new("Num").order("n");

        let (first, cursor) = store.fetch_page(&query, None, 2).unwrap();
        assert_eq!(numbers(&first), vec![1, 2]);
        let cursor = cursor.unwrap();

        let (second, cursor) = store.fetch_page(&query, Some(&cursor), 2).unwrap();
        assert_eq!(numbers(&second), vec![3, 4]);

        let (third, cursor) = store.fetch_page(&query, cursor.as_ref(), 2).unwrap();
        assert_eq!(numbers(&third), vec![5]);
        assert!(cursor.is_none());
    }

    #[test]
    fn test_bad_cursor_rejected() {
        let store = seeded();
        let result = store.fetch_page(&Query::new("Num"), Some(&Cursor::new("nope")), 2);
        assert!(matches!(result, Err(StoreError::InvalidCursor(_))));
    }

    #[test]
    fn test_transaction_commits() {
        let store = MemoryStore::new();
        let key = Key::with_name("Counter", "a");
        let count = transact(&store, |txn| {
            let mut entity = txn.get(&key)?.unwrap_or_else(|| Entity::with_key(key.clone()));
            let next = entity.get("count").and_then(Value::as_i64).unwrap_or(0) + 1;
            entity.set("count", next);
            txn.put(entity)?;
            Ok(next)
        })
        .unwrap();
        assert_eq!(count, 1);
        assert_eq!(
            store.get(&key).unwrap().unwrap().get("count"),
            Some(&Value::Int(1))
        );
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let store = MemoryStore::new();
        let result = store.run_in_transaction(&mut |txn| {
            txn.put(Entity::new("Post"))?;
            Err(StoreError::TransactionAborted("boom".to_string()))
        });
        assert!(result.is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_transaction_reads_own_writes() {
        let store = MemoryStore::new();
        let key = Key::with_name("K", "x");
        store
            .run_in_transaction(&mut |txn| {
                txn.put(Entity::with_key(key.clone()).with("v", 1i64))?;
                assert!(txn.get(&key)?.is_some());
                assert!(txn.delete(&key)?);
                assert!(txn.get(&key)?.is_none());
                Ok(())
            })
            .unwrap();
        assert!(store.get(&key).unwrap().is_none());
    }
}
