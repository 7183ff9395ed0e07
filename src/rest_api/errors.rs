//! # REST API Errors
//!
//! Error types for API handlers and their HTTP rendering. Client errors
//! carry their message; server errors render generically unless the
//! renderer runs in debug mode.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::codec::CodecError;
use crate::counter::CounterError;
use crate::observability::{error_chain, ErrorReporter, RequestInfo};
use crate::paginate::PageError;
use crate::query::QueryError;
use crate::store::StoreError;

use super::config::Method;

/// Body of every production 500
pub const SERVER_ERROR_MESSAGE: &str = "A server error has occurred";

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// API handler errors
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    // ==================
    // Client Errors (4xx)
    // ==================
    /// Filter matching no operator form
    #[error("Malformed filter: {0}")]
    MalformedFilter(String),

    /// Order on an undeclared property
    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    /// Unusable query parameter
    #[error("Invalid query parameter: {0}")]
    InvalidParam(String),

    /// Invalid request body
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// Key that does not decode; no entity can have it
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Method not enabled on this handler
    #[error("Method {0} not allowed")]
    MethodNotAllowed(Method),

    /// Resource not found
    #[error("Resource not found")]
    NotFound,

    // ==================
    // Server Errors (5xx)
    // ==================
    /// Backing store failure
    #[error("Store failure")]
    Store(#[source] StoreError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            ApiError::MalformedFilter(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidOrder(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidParam(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidBody(_) => StatusCode::BAD_REQUEST,

            // 404 Not Found
            ApiError::InvalidKey(_) => StatusCode::NOT_FOUND,
            ApiError::NotFound => StatusCode::NOT_FOUND,

            // 405 Method Not Allowed
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,

            // 500 Internal Server Error
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Variant name, reported as the exception type
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::MalformedFilter(_) => "MalformedFilter",
            ApiError::InvalidOrder(_) => "InvalidOrder",
            ApiError::InvalidParam(_) => "InvalidParam",
            ApiError::InvalidBody(_) => "InvalidBody",
            ApiError::InvalidKey(_) => "InvalidKey",
            ApiError::MethodNotAllowed(_) => "MethodNotAllowed",
            ApiError::NotFound => "NotFound",
            ApiError::Store(_) => "Store",
            ApiError::Internal(_) => "Internal",
        }
    }

    /// Whether the error goes to the error tracker
    fn is_reportable(&self) -> bool {
        matches!(self, ApiError::InvalidOrder(_)) || !self.is_client_error()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidKey(key) => ApiError::InvalidKey(key),
            StoreError::InvalidCursor(cursor) => ApiError::InvalidParam(format!("cursor {}", cursor)),
            other => ApiError::Store(other),
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::MalformedFilter(raw) => ApiError::MalformedFilter(raw),
            QueryError::InvalidOrder(raw) => ApiError::InvalidOrder(raw),
        }
    }
}

impl From<CodecError> for ApiError {
    fn from(err: CodecError) -> Self {
        ApiError::InvalidBody(err.to_string())
    }
}

impl From<CounterError> for ApiError {
    fn from(err: CounterError) -> Self {
        match err {
            CounterError::Store(e) => e.into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<PageError> for ApiError {
    fn from(err: PageError) -> Self {
        match err {
            PageError::Store(e) => e.into(),
            PageError::EmptyPage(_) => ApiError::NotFound,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl From<&ApiError> for ErrorResponse {
    fn from(err: &ApiError) -> Self {
        let error = if err.is_client_error() {
            err.to_string()
        } else {
            SERVER_ERROR_MESSAGE.to_string()
        };
        Self {
            error,
            code: err.status_code().as_u16(),
        }
    }
}

/// Exception details of a debug-mode 500
#[derive(Debug, Serialize)]
pub struct ExcInfo {
    pub exc_type: String,
    pub exc_value: String,
    pub frames: Vec<String>,
}

/// Debug-mode 500 body
#[derive(Debug, Serialize)]
pub struct DebugErrorResponse {
    pub exc_info: ExcInfo,
    pub code: u16,
}

impl From<&ApiError> for DebugErrorResponse {
    fn from(err: &ApiError) -> Self {
        let mut frames = error_chain(err);
        let exc_value = frames.remove(0);
        Self {
            exc_info: ExcInfo {
                exc_type: err.kind().to_string(),
                exc_value,
                frames,
            },
            code: err.status_code().as_u16(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse::from(&self));
        (status, body).into_response()
    }
}

/// Logs, reports and renders handler errors
#[derive(Clone)]
pub struct ErrorRenderer {
    debug: bool,
    reporter: Arc<dyn ErrorReporter>,
}

impl ErrorRenderer {
    pub fn new(debug: bool, reporter: Arc<dyn ErrorReporter>) -> Self {
        Self { debug, reporter }
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn render(&self, request: &RequestInfo, err: ApiError) -> Response {
        let status = err.status_code();
        if err.is_client_error() {
            warn!(method = %request.method, path = %request.path, status = status.as_u16(), "{}", err);
        } else {
            error!(
                method = %request.method,
                path = %request.path,
                chain = ?error_chain(&err),
                "request failed: {}",
                err
            );
        }
        if err.is_reportable() {
            self.reporter.capture_exception(request, &err);
        }

        if self.debug && !err.is_client_error() {
            (status, Json(DebugErrorResponse::from(&err))).into_response()
        } else {
            err.into_response()
        }
    }
}
