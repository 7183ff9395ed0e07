//! # Sharded Counter
//!
//! Per counter name there is one config entity (`num_shards`, never
//! shrinks) and up to `num_shards` shard entities created lazily on first
//! write. The counter value is the sum of every shard's `count`.
//!
//! The cache adjustment after a shard write is not transactional with it.
//! When the cached total is absent the adjustment is a no-op and the next
//! read recomputes from the shards.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::cache::Cache;
use crate::store::{transact, DocumentStore, Entity, FilterOp, Key, Query, Value};

use super::errors::{CounterError, CounterResult};

/// Entity kind holding per-counter shard counts
pub const SHARD_CONFIG_KIND: &str = "GeneralCounterShardConfig";

/// Entity kind holding individual shards
pub const SHARD_KIND: &str = "GeneralCounterShard";

const NAME_PROPERTY: &str = "name";
const NUM_SHARDS_PROPERTY: &str = "num_shards";
const COUNT_PROPERTY: &str = "count";

/// Counter tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterConfig {
    /// Shard count for newly configured counters
    pub default_num_shards: usize,
    /// Lifetime of a cached total
    pub cache_ttl: Duration,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            default_num_shards: 20,
            cache_ttl: Duration::from_secs(60),
        }
    }
}

/// Sharded counters over a document store, fronted by a cache
pub struct ShardedCounter {
    store: Arc<dyn DocumentStore>,
    cache: Arc<dyn Cache>,
    config: CounterConfig,
    rng: Mutex<StdRng>,
}

impl ShardedCounter {
    pub fn new(store: Arc<dyn DocumentStore>, cache: Arc<dyn Cache>, config: CounterConfig) -> Self {
        Self::with_rng(store, cache, config, StdRng::from_entropy())
    }

    /// Deterministic shard selection
    pub fn with_seed(
        store: Arc<dyn DocumentStore>,
        cache: Arc<dyn Cache>,
        config: CounterConfig,
        seed: u64,
    ) -> Self {
        Self::with_rng(store, cache, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        store: Arc<dyn DocumentStore>,
        cache: Arc<dyn Cache>,
        config: CounterConfig,
        rng: StdRng,
    ) -> Self {
        Self {
            store,
            cache,
            config: CounterConfig {
                default_num_shards: config.default_num_shards.max(1),
                ..config
            },
            rng: Mutex::new(rng),
        }
    }

    fn cache_key(name: &str) -> String {
        format!("counter:{}", name)
    }

    fn config_key(name: &str) -> Key {
        Key::with_name(SHARD_CONFIG_KIND, name)
    }

    fn shard_key(name: &str, index: usize) -> Key {
        Key::with_name(SHARD_KIND, format!("{}:{}", name, index))
    }

    fn shards_of(name: &str, entity: &Entity) -> CounterResult<usize> {
        entity
            .get(NUM_SHARDS_PROPERTY)
            .and_then(Value::as_i64)
            .and_then(|n| usize::try_from(n).ok())
            .filter(|n| *n > 0)
            .ok_or_else(|| CounterError::CorruptConfig(name.to_string()))
    }

    /// Shard count, creating the config with the default on first use
    fn get_or_insert_config(&self, name: &str) -> CounterResult<usize> {
        let key = Self::config_key(name);
        if let Some(existing) = self.store.get(&key)? {
            return Self::shards_of(name, &existing);
        }

        let default = self.config.default_num_shards;
        let entity = transact(self.store.as_ref(), |txn| {
            if let Some(existing) = txn.get(&key)? {
                return Ok(existing);
            }
            let created = Entity::with_key(key.clone())
                .with(NAME_PROPERTY, name)
                .with(NUM_SHARDS_PROPERTY, default as i64);
            txn.put(created.clone())?;
            Ok(created)
        })?;
        Self::shards_of(name, &entity)
    }

    /// Configured shard count, `None` before the counter is first used
    pub fn num_shards(&self, name: &str) -> CounterResult<Option<usize>> {
        match self.store.get(&Self::config_key(name))? {
            Some(entity) => Self::shards_of(name, &entity).map(Some),
            None => Ok(None),
        }
    }

    fn pick_shard(&self, num_shards: usize) -> CounterResult<usize> {
        let mut rng = self.rng.lock().map_err(|_| CounterError::SelectorPoisoned)?;
        Ok(rng.gen_range(0..num_shards))
    }

    fn adjust(&self, name: &str, delta: i64) -> CounterResult<()> {
        let num_shards = self.get_or_insert_config(name)?;
        let index = self.pick_shard(num_shards)?;
        let key = Self::shard_key(name, index);

        transact(self.store.as_ref(), |txn| {
            let mut shard = txn.get(&key)?.unwrap_or_else(|| {
                Entity::with_key(key.clone())
                    .with(NAME_PROPERTY, name)
                    .with(COUNT_PROPERTY, 0i64)
            });
            let count = shard.get(COUNT_PROPERTY).and_then(Value::as_i64).unwrap_or(0);
            shard.set(COUNT_PROPERTY, count.saturating_add(delta));
            txn.put(shard)?;
            Ok(())
        })?;
        debug!(counter = name, shard = index, delta, "adjusted counter shard");

        if let Err(e) = self.cache.incr(&Self::cache_key(name), delta) {
            warn!(counter = name, error = %e, "counter cache adjustment failed");
        }
        Ok(())
    }

    pub fn increment(&self, name: &str) -> CounterResult<()> {
        self.adjust(name, 1)
    }

    pub fn decrement(&self, name: &str) -> CounterResult<()> {
        self.adjust(name, -1)
    }

    /// Counter value, from the cache when present
    ///
    /// On a miss every shard is summed and the total is added to the cache
    /// for the configured TTL.
    pub fn get_count(&self, name: &str) -> CounterResult<i64> {
        let cache_key = Self::cache_key(name);
        match self.cache.get(&cache_key) {
            Ok(Some(cached)) => {
                if let Some(total) = cached.as_i64() {
                    return Ok(total);
                }
            }
            Ok(None) => {}
            Err(e) => warn!(counter = name, error = %e, "counter cache read failed"),
        }

        let query = Query::new(SHARD_KIND).filter(NAME_PROPERTY, FilterOp::Eq, name);
        let total: i64 = self
            .store
            .fetch(&query, 0, None)?
            .iter()
            .filter_map(|shard| shard.get(COUNT_PROPERTY).and_then(Value::as_i64))
            .sum();
        debug!(counter = name, total, "summed counter shards");

        if let Err(e) = self
            .cache
            .add(&cache_key, JsonValue::from(total), self.config.cache_ttl)
        {
            warn!(counter = name, error = %e, "counter cache fill failed");
        }
        Ok(total)
    }

    /// Raise the shard count to at least `num`; never lowers it
    pub fn increase_shards(&self, name: &str, num: usize) -> CounterResult<usize> {
        let key = Self::config_key(name);
        let default = self.config.default_num_shards;
        let entity = transact(self.store.as_ref(), |txn| {
            let mut config = txn.get(&key)?.unwrap_or_else(|| {
                Entity::with_key(key.clone())
                    .with(NAME_PROPERTY, name)
                    .with(NUM_SHARDS_PROPERTY, default as i64)
            });
            let current = config
                .get(NUM_SHARDS_PROPERTY)
                .and_then(Value::as_i64)
                .unwrap_or(default as i64);
            let target = i64::try_from(num).unwrap_or(i64::MAX);
            config.set(NUM_SHARDS_PROPERTY, current.max(target));
            txn.put(config.clone())?;
            Ok(config)
        })?;
        Self::shards_of(name, &entity)
    }
}
