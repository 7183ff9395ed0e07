//! # Cache Errors

use thiserror::Error;

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Fronting cache errors
///
/// Callers treat every variant as a miss; none of them fail a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// Cache service could not be reached
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    /// Cached value could not be encoded or decoded
    #[error("Cache serialization error: {0}")]
    Serialization(String),
}
