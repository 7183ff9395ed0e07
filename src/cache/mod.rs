//! # Fronting Cache
//!
//! Best-effort TTL cache in front of the document store, plus the pieces
//! built on it: canonical cache keys, explicit memoization, and the
//! per-handler cache key registry used for bulk invalidation.

pub mod backend;
pub mod errors;
pub mod keys;
pub mod memo;
pub mod memory;
pub mod registry;

pub use backend::Cache;
pub use errors::{CacheError, CacheResult};
pub use keys::{build_cache_key, canonicalize, encode_pairs};
pub use memo::{memo_key, memoize, MemoOptions};
pub use memory::{CacheStats, MemoryCache};
pub use registry::{CacheKeyRegistry, REGISTRY_KIND};
