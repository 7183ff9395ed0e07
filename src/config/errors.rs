//! # Configuration Errors

use thiserror::Error;

/// Result type for configuration
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Settings file could not be read
    #[error("Cannot read config file {path}: {message}")]
    Io { path: String, message: String },

    /// Settings file is not valid JSON for the settings schema
    #[error("Invalid config file: {0}")]
    Parse(String),

    /// A setting holds an unusable value
    #[error("Invalid setting {field}: {message}")]
    Invalid { field: String, message: String },

    /// Handler configuration rejected by its builder
    #[error("Invalid handler config {handler}: {message}")]
    Handler { handler: String, message: String },
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn handler(handler: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Handler {
            handler: handler.into(),
            message: message.into(),
        }
    }
}
