//! # Query Compilation Errors

use thiserror::Error;

/// Result type for query compilation
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors turning request parameters into a store query
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Filter matching none of the operator forms
    #[error("Malformed filter: {0}")]
    MalformedFilter(String),

    /// Order clause naming an undeclared property
    #[error("Invalid order: {0}")]
    InvalidOrder(String),
}
