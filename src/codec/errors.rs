//! # Codec Errors

use thiserror::Error;

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// JSON codec errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    /// `key:` string that does not decode to a key
    #[error("Invalid key reference: {0}")]
    InvalidKey(String),

    /// JSON object that is not a `{lat, lon}` geopoint
    #[error("Unsupported object value: {0}")]
    UnsupportedObject(String),

    /// Request body is not a JSON object
    #[error("Invalid JSON body: {0}")]
    InvalidBody(String),
}
