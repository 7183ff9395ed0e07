//! # Store Errors
//!
//! Error types for the document store abstraction.

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Document store errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// Encoded key could not be decoded
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Cursor was not issued by this store or is stale
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    /// Transaction body failed; no writes were applied
    #[error("Transaction aborted: {0}")]
    TransactionAborted(String),

    /// A lock guarding store state was poisoned by a panicking writer
    #[error("Store lock poisoned")]
    LockPoisoned,

    /// Backend failure
    #[error("Store backend error: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = StoreError::InvalidKey("zz".to_string());
        assert_eq!(err.to_string(), "Invalid key: zz");
        assert_eq!(StoreError::LockPoisoned.to_string(), "Store lock poisoned");
    }
}
