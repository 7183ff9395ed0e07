//! # Configuration
//!
//! Startup settings, built once and passed down explicitly.

pub mod errors;
pub mod settings;

pub use errors::{ConfigError, ConfigResult};
pub use settings::{ApiSettings, CounterSettings, Settings};
