//! Observability for gantry
//!
//! - Structured logging through `tracing`
//! - Error reporting to an external tracker
//!
//! # Usage
//!
//! ```ignore
//! use gantry::observability::{init_logging, reporter_from_config, LoggingConfig};
//!
//! init_logging(&LoggingConfig::default());
//! let reporter = reporter_from_config(&settings.error_reporting);
//! ```

mod logging;
mod reporter;

pub use logging::{init_logging, LoggingConfig};
pub use reporter::{
    error_chain, reporter_from_config, ErrorReporter, ErrorReportingConfig, LogReporter,
    MemoryReporter, NullReporter, Report, RequestInfo,
};
