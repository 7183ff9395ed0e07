//! # In-Memory Fronting Cache
//!
//! A [`Cache`] over a mutex-guarded map with lazy TTL expiry. Statistics
//! are passive and never influence caching.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde_json::Value;

use super::backend::Cache;
use super::errors::{CacheError, CacheResult};

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(value: Value, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: (!ttl.is_zero()).then(|| Instant::now() + ttl),
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// Cache statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub deletes: u64,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, CacheEntry>,
    stats: CacheStats,
}

impl Inner {
    /// Live entry for `key`, dropping it if expired
    fn live_mut(&mut self, key: &str) -> Option<&mut CacheEntry> {
        let now = Instant::now();
        if self.entries.get(key).is_some_and(|e| !e.is_live(now)) {
            self.entries.remove(key);
        }
        self.entries.get_mut(key)
    }
}

/// In-memory cache
#[derive(Debug, Default)]
pub struct MemoryCache {
    inner: Mutex<Inner>,
    unavailable: AtomicBool,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: every operation fails while set
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Drop every entry
    pub fn flush_all(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.entries.clear();
        }
    }

    /// Whether a live entry exists for `key`
    pub fn contains(&self, key: &str) -> bool {
        self.inner
            .lock()
            .map(|mut inner| inner.live_mut(key).is_some())
            .unwrap_or(false)
    }

    /// Number of stored entries, including not yet collected expired ones
    pub fn len(&self) -> usize {
        self.inner.lock().map(|i| i.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.inner
            .lock()
            .map(|i| i.stats.clone())
            .unwrap_or_default()
    }

    fn lock(&self) -> CacheResult<std::sync::MutexGuard<'_, Inner>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("memory cache disabled".to_string()));
        }
        self.inner
            .lock()
            .map_err(|_| CacheError::Unavailable("memory cache lock poisoned".to_string()))
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> CacheResult<Option<Value>> {
        let mut inner = self.lock()?;
        let value = inner.live_mut(key).map(|e| e.value.clone());
        if value.is_some() {
            inner.stats.hits += 1;
        } else {
            inner.stats.misses += 1;
        }
        Ok(value)
    }

    fn set(&self, key: &str, value: Value, ttl: Duration) -> CacheResult<()> {
        let mut inner = self.lock()?;
        inner.entries.insert(key.to_string(), CacheEntry::new(value, ttl));
        inner.stats.writes += 1;
        Ok(())
    }

    fn add(&self, key: &str, value: Value, ttl: Duration) -> CacheResult<bool> {
        let mut inner = self.lock()?;
        if inner.live_mut(key).is_some() {
            return Ok(false);
        }
        inner.entries.insert(key.to_string(), CacheEntry::new(value, ttl));
        inner.stats.writes += 1;
        Ok(true)
    }

    fn delete_multi(&self, keys: &[String]) -> CacheResult<()> {
        let mut inner = self.lock()?;
        for key in keys {
            if inner.entries.remove(key).is_some() {
                inner.stats.deletes += 1;
            }
        }
        Ok(())
    }

    fn incr(&self, key: &str, delta: i64) -> CacheResult<Option<i64>> {
        let mut inner = self.lock()?;
        let Some(entry) = inner.live_mut(key) else {
            return Ok(None);
        };
        let Some(current) = entry.value.as_i64() else {
            return Ok(None);
        };
        let next = current.saturating_add(delta);
        entry.value = Value::from(next);
        Ok(Some(next))
    }
}
