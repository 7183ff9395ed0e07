//! # Sharded Counters
//!
//! A logical counter split across N independently transacted shards.
//! Writes pick a shard at random, so concurrent increments rarely contend
//! on the same record. Reads sum every shard and are absorbed by the
//! fronting cache, which converges on the true total within its TTL.

pub mod errors;
pub mod sharded;

pub use errors::{CounterError, CounterResult};
pub use sharded::{CounterConfig, ShardedCounter, SHARD_CONFIG_KIND, SHARD_KIND};
