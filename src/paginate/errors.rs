//! # Pagination Errors

use thiserror::Error;

use crate::store::StoreError;

/// Result type for pagination
pub type PageResult<T> = Result<T, PageError>;

/// Pagination errors
#[derive(Debug, Clone, Error)]
pub enum PageError {
    /// Page parameter is not an integer
    #[error("That page number is not an integer: {0}")]
    NotAnInteger(String),

    /// Page number outside the valid range
    #[error("That page contains no results: {0}")]
    EmptyPage(i64),

    /// Page size of zero
    #[error("Page size must be at least 1")]
    ZeroPerPage,

    /// Counting the source failed
    #[error("{0}")]
    Store(#[from] StoreError),
}
