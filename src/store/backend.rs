//! # Document Store Interface
//!
//! The capabilities the framework needs from a backing document database:
//! key-based get/put/delete, all-or-nothing transactions, and ordered,
//! filtered scans with counts and opaque resumable cursors.

use super::entity::Entity;
use super::errors::StoreResult;
use super::key::Key;
use super::query::{Cursor, Query};

/// Operations available inside a transaction
///
/// Reads observe the transaction's own buffered writes. Nothing becomes
/// visible to other callers until the transaction body returns `Ok`.
pub trait Transaction {
    fn get(&mut self, key: &Key) -> StoreResult<Option<Entity>>;

    /// Stage a write; allocates an id for unkeyed entities
    fn put(&mut self, entity: Entity) -> StoreResult<Key>;

    /// Stage a delete; returns whether the entity existed
    fn delete(&mut self, key: &Key) -> StoreResult<bool>;
}

/// Transaction body
pub type TransactionFn<'a> = dyn FnMut(&mut dyn Transaction) -> StoreResult<()> + 'a;

/// A schema-flexible document database
pub trait DocumentStore: Send + Sync {
    fn get(&self, key: &Key) -> StoreResult<Option<Entity>>;

    /// Insert or overwrite; allocates an id for unkeyed entities
    fn put(&self, entity: Entity) -> StoreResult<Key>;

    /// Remove by key; returns whether the entity existed
    fn delete(&self, key: &Key) -> StoreResult<bool>;

    /// Run `body` atomically: either every staged write applies or none do
    fn run_in_transaction(&self, body: &mut TransactionFn<'_>) -> StoreResult<()>;

    /// Number of matching entities, capped at `limit`
    fn count(&self, query: &Query, limit: Option<usize>) -> StoreResult<usize>;

    /// Matching entities in query order, skipping `offset`
    fn fetch(&self, query: &Query, offset: usize, limit: Option<usize>) -> StoreResult<Vec<Entity>>;

    /// Up to `limit` entities resuming from `cursor`
    ///
    /// The returned cursor is `None` once the scan is exhausted.
    fn fetch_page(
        &self,
        query: &Query,
        cursor: Option<&Cursor>,
        limit: usize,
    ) -> StoreResult<(Vec<Entity>, Option<Cursor>)>;
}

/// Run a transaction that produces a value
pub fn transact<T, F>(store: &dyn DocumentStore, mut body: F) -> StoreResult<T>
where
    F: FnMut(&mut dyn Transaction) -> StoreResult<T>,
{
    let mut output = None;
    store.run_in_transaction(&mut |txn| {
        output = Some(body(txn)?);
        Ok(())
    })?;
    output.ok_or_else(|| {
        super::errors::StoreError::TransactionAborted("transaction produced no result".to_string())
    })
}
