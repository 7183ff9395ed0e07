//! # Error Reporting
//!
//! Fire-and-forget delivery of server failures to an error tracker.
//! Reporters never fail and never panic; a broken reporter must not turn
//! a handled error into a crash.

use std::sync::{Arc, Mutex};

use axum::http::{HeaderMap, Method, Uri};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

/// Error reporting configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReportingConfig {
    /// Send reports at all (default: false)
    #[serde(default)]
    pub enabled: bool,

    /// Tracker endpoint; required when enabled
    #[serde(default)]
    pub dsn: Option<String>,
}

/// The request an error happened in
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequestInfo {
    pub method: String,
    pub path: String,
    pub query_string: String,
    pub headers: Vec<(String, String)>,
}

impl RequestInfo {
    pub fn from_http(method: &Method, uri: &Uri, headers: &HeaderMap) -> Self {
        Self {
            method: method.to_string(),
            path: uri.path().to_string(),
            query_string: uri.query().unwrap_or_default().to_string(),
            headers: headers
                .iter()
                .map(|(name, value)| {
                    (
                        name.to_string(),
                        String::from_utf8_lossy(value.as_bytes()).into_owned(),
                    )
                })
                .collect(),
        }
    }
}

/// Messages of `error` and every error in its source chain, outermost first
pub fn error_chain(error: &dyn std::error::Error) -> Vec<String> {
    let mut chain = vec![error.to_string()];
    let mut source = error.source();
    while let Some(cause) = source {
        chain.push(cause.to_string());
        source = cause.source();
    }
    chain
}

/// Error tracking collaborator
pub trait ErrorReporter: Send + Sync {
    fn capture_exception(&self, request: &RequestInfo, error: &dyn std::error::Error);
}

/// Reporting disabled
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl ErrorReporter for NullReporter {
    fn capture_exception(&self, _request: &RequestInfo, _error: &dyn std::error::Error) {}
}

/// Reports as structured error events on the log stream
#[derive(Debug, Clone)]
pub struct LogReporter {
    dsn: String,
}

impl LogReporter {
    pub fn new(dsn: impl Into<String>) -> Self {
        Self { dsn: dsn.into() }
    }
}

impl ErrorReporter for LogReporter {
    fn capture_exception(&self, request: &RequestInfo, error: &dyn std::error::Error) {
        let event_id = Uuid::new_v4();
        let header_names: Vec<&str> = request.headers.iter().map(|(n, _)| n.as_str()).collect();
        error!(
            event_id = %event_id,
            dsn = %self.dsn,
            method = %request.method,
            url = %request.path,
            query_string = %request.query_string,
            headers = ?header_names,
            chain = ?error_chain(error),
            "captured exception: {}",
            error
        );
    }
}

/// A captured report
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub event_id: Uuid,
    pub captured_at: DateTime<Utc>,
    pub request: RequestInfo,
    pub message: String,
    pub chain: Vec<String>,
}

/// Keeps reports in memory
#[derive(Debug, Default)]
pub struct MemoryReporter {
    reports: Mutex<Vec<Report>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<Report> {
        self.reports.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.reports.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ErrorReporter for MemoryReporter {
    fn capture_exception(&self, request: &RequestInfo, error: &dyn std::error::Error) {
        let report = Report {
            event_id: Uuid::new_v4(),
            captured_at: Utc::now(),
            request: request.clone(),
            message: error.to_string(),
            chain: error_chain(error),
        };
        if let Ok(mut reports) = self.reports.lock() {
            reports.push(report);
        }
    }
}

/// Reporter selected by configuration
pub fn reporter_from_config(config: &ErrorReportingConfig) -> Arc<dyn ErrorReporter> {
    match (&config.enabled, &config.dsn) {
        (true, Some(dsn)) => Arc::new(LogReporter::new(dsn.clone())),
        _ => Arc::new(NullReporter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("outer")]
    struct Outer(#[source] Inner);

    #[derive(Debug, Error)]
    #[error("inner")]
    struct Inner;

    #[test]
    fn test_error_chain() {
        assert_eq!(error_chain(&Outer(Inner)), vec!["outer", "inner"]);
    }

    #[test]
    fn test_memory_reporter_captures() {
        let reporter = MemoryReporter::new();
        let uri: Uri = "/posts?filter=a__1".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("x-test", "1".parse().unwrap());
        let request = RequestInfo::from_http(&Method::GET, &uri, &headers);

        reporter.capture_exception(&request, &Outer(Inner));
        let reports = reporter.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].request.path, "/posts");
        assert_eq!(reports[0].request.query_string, "filter=a__1");
        assert_eq!(reports[0].request.headers, vec![("x-test".to_string(), "1".to_string())]);
        assert_eq!(reports[0].chain.len(), 2);
    }

    #[test]
    fn test_reporter_selection() {
        let disabled = ErrorReportingConfig::default();
        // NullReporter swallows everything
        reporter_from_config(&disabled).capture_exception(&RequestInfo::default(), &Inner);

        let enabled = ErrorReportingConfig {
            enabled: true,
            dsn: Some("https://tracker.invalid/1".to_string()),
        };
        reporter_from_config(&enabled).capture_exception(&RequestInfo::default(), &Inner);
    }
}
