//! # REST API Module
//!
//! Paginated, filterable, cacheable resource handlers and the HTTP
//! routes that expose them.

pub mod config;
pub mod errors;
pub mod handler;
pub mod response;
pub mod server;

pub use config::{ApiHandlerConfig, ApiHandlerConfigBuilder, CachePolicy, DataSource, Method};
pub use errors::{ApiError, ApiResult, ErrorRenderer, ErrorResponse, SERVER_ERROR_MESSAGE};
pub use handler::ApiHandler;
pub use response::{ListResponse, StatusResponse};
pub use server::{api_routes, ApiState};
