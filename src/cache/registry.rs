//! # Cache Key Registry
//!
//! Persistent side index from a handler identity (`par_key`) to every
//! cache key that handler has written. A write to the handler's data
//! flushes all of them at once.
//!
//! Invariant: a key is registered before its cache entry is written, so
//! every cached response of a handler is reachable from its entry.
//! Registration is a set-union inside a store transaction; concurrent
//! first writes for the same handler cannot drop each other's keys.
//! Entries are never removed.
//!
//! Each flush bumps the entry's generation before deleting. A reader that
//! noted the generation before computing registers with
//! [`CacheKeyRegistry::register_at`], which refuses once a flush has run,
//! and rechecks with [`CacheKeyRegistry::is_current`] after its write; a
//! response computed before a write therefore never outlives the flush.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::store::{transact, DocumentStore, Entity, Key, StoreResult, Value};

use super::backend::Cache;

/// Entity kind holding registry entries
pub const REGISTRY_KIND: &str = "CacheKeyRegistry";

const KEYS_PROPERTY: &str = "keys";
const GENERATION_PROPERTY: &str = "generation";

/// Store-backed registry of handler cache keys
#[derive(Clone)]
pub struct CacheKeyRegistry {
    store: Arc<dyn DocumentStore>,
    cache: Arc<dyn Cache>,
}

impl CacheKeyRegistry {
    pub fn new(store: Arc<dyn DocumentStore>, cache: Arc<dyn Cache>) -> Self {
        Self { store, cache }
    }

    fn entry_key(par_key: &str) -> Key {
        Key::with_name(REGISTRY_KIND, par_key)
    }

    fn keys_of(entity: &Entity) -> BTreeSet<String> {
        match entity.get(KEYS_PROPERTY) {
            Some(Value::List(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => BTreeSet::new(),
        }
    }

    fn generation_of(entity: &Entity) -> i64 {
        match entity.get(GENERATION_PROPERTY) {
            Some(Value::Int(n)) => *n,
            _ => 0,
        }
    }

    /// Number of flushes a handler has seen
    pub fn generation(&self, par_key: &str) -> StoreResult<i64> {
        Ok(self
            .store
            .get(&Self::entry_key(par_key))?
            .map(|e| Self::generation_of(&e))
            .unwrap_or(0))
    }

    /// Whether no flush has run since `generation` was read
    pub fn is_current(&self, par_key: &str, generation: i64) -> StoreResult<bool> {
        Ok(self.generation(par_key)? == generation)
    }

    /// Registered cache keys for a handler, sorted
    pub fn keys(&self, par_key: &str) -> StoreResult<Vec<String>> {
        Ok(self
            .store
            .get(&Self::entry_key(par_key))?
            .map(|e| Self::keys_of(&e).into_iter().collect())
            .unwrap_or_default())
    }

    /// Add a cache key to a handler's entry, creating the entry if needed
    pub fn register(&self, par_key: &str, cache_key: &str) -> StoreResult<()> {
        self.union(par_key, cache_key, None).map(|_| ())
    }

    /// Add a cache key only if the handler is still at `generation`
    ///
    /// Returns `false`, registering nothing, when a flush ran in between.
    pub fn register_at(&self, par_key: &str, cache_key: &str, generation: i64) -> StoreResult<bool> {
        self.union(par_key, cache_key, Some(generation))
    }

    fn union(&self, par_key: &str, cache_key: &str, expected: Option<i64>) -> StoreResult<bool> {
        let entry_key = Self::entry_key(par_key);
        let matches = |entity: &Entity| expected.map_or(true, |g| Self::generation_of(entity) == g);

        if let Some(existing) = self.store.get(&entry_key)? {
            if matches(&existing) && Self::keys_of(&existing).contains(cache_key) {
                return Ok(true);
            }
        }

        let outcome = transact(self.store.as_ref(), |txn| {
            let mut entity = txn
                .get(&entry_key)?
                .unwrap_or_else(|| Entity::with_key(entry_key.clone()));
            if !matches(&entity) {
                return Ok(None);
            }
            let mut keys = Self::keys_of(&entity);
            if !keys.insert(cache_key.to_string()) {
                return Ok(Some(false));
            }
            entity.set(
                KEYS_PROPERTY,
                Value::List(keys.into_iter().map(Value::Str).collect()),
            );
            txn.put(entity)?;
            Ok(Some(true))
        })?;

        match outcome {
            Some(true) => debug!(par_key, cache_key, "registered cache key"),
            Some(false) => {}
            None => debug!(par_key, cache_key, "flushed since read, not registering"),
        }
        Ok(outcome.is_some())
    }

    fn bump_generation(&self, par_key: &str) -> StoreResult<()> {
        let entry_key = Self::entry_key(par_key);
        transact(self.store.as_ref(), |txn| {
            let mut entity = txn
                .get(&entry_key)?
                .unwrap_or_else(|| Entity::with_key(entry_key.clone()));
            let next = Self::generation_of(&entity) + 1;
            entity.set(GENERATION_PROPERTY, Value::Int(next));
            txn.put(entity)?;
            Ok(())
        })
    }

    /// Delete every registered cache entry for a handler
    ///
    /// Returns the number of keys flushed. An unreachable cache is logged;
    /// it cannot serve the stale entries either.
    pub fn flush(&self, par_key: &str) -> StoreResult<usize> {
        self.bump_generation(par_key)?;
        let keys = self.keys(par_key)?;
        if keys.is_empty() {
            return Ok(0);
        }
        match self.cache.delete_multi(&keys) {
            Ok(()) => info!(par_key, count = keys.len(), "flushed cached responses"),
            Err(e) => warn!(par_key, error = %e, "cache flush failed"),
        }
        Ok(keys.len())
    }
}
