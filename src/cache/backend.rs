//! # Fronting Cache Interface
//!
//! A best-effort, TTL-based key-value cache over JSON values. Writes are
//! last-write-wins overwrites with no locking.

use std::time::Duration;

use serde_json::Value;

use super::errors::CacheResult;

/// Best-effort key-value cache
pub trait Cache: Send + Sync {
    fn get(&self, key: &str) -> CacheResult<Option<Value>>;

    /// Store unconditionally; `Duration::ZERO` never expires
    fn set(&self, key: &str, value: Value, ttl: Duration) -> CacheResult<()>;

    /// Store only if absent; returns whether the value was written
    fn add(&self, key: &str, value: Value, ttl: Duration) -> CacheResult<bool>;

    fn delete_multi(&self, keys: &[String]) -> CacheResult<()>;

    /// Add `delta` to an integer entry
    ///
    /// Returns the new value, or `None` without writing anything when the
    /// key is absent or not an integer.
    fn incr(&self, key: &str, delta: i64) -> CacheResult<Option<i64>>;

    /// Subtract `delta` from an integer entry; see [`Cache::incr`]
    fn decr(&self, key: &str, delta: i64) -> CacheResult<Option<i64>> {
        self.incr(key, -delta)
    }
}
