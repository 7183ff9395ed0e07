//! # Counter Errors

use thiserror::Error;

use crate::store::StoreError;

/// Result type for counter operations
pub type CounterResult<T> = Result<T, CounterError>;

/// Sharded counter errors
#[derive(Debug, Clone, Error)]
pub enum CounterError {
    /// Shard config entity holds an unusable shard count
    #[error("Corrupt shard config for counter {0}")]
    CorruptConfig(String),

    /// Shard selection state was poisoned by a panicking thread
    #[error("Shard selector unavailable")]
    SelectorPoisoned,

    /// Backing store failure
    #[error("{0}")]
    Store(#[from] StoreError),
}
