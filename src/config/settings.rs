//! # Application Settings
//!
//! Assembled once at startup: defaults, overlaid by an optional JSON
//! file, then validated. Every field has a default so a settings file
//! only needs the values it changes.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::counter::CounterConfig;
use crate::http_server::HttpServerConfig;
use crate::observability::{ErrorReportingConfig, LoggingConfig};

use super::errors::{ConfigError, ConfigResult};

/// Defaults for API handlers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Page size when a request names none (default: 20)
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,

    /// Upper bound for a requested page size (default: 1000)
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,

    /// Response cache lifetime in seconds (default: 60)
    #[serde(default = "default_cache_ttl_secs")]
    pub default_cache_ttl_secs: u64,
}

fn default_page_size() -> usize {
    20
}

fn default_max_page_size() -> usize {
    1000
}

fn default_cache_ttl_secs() -> u64 {
    60
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            default_cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl ApiSettings {
    pub fn default_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.default_cache_ttl_secs)
    }
}

/// Sharded counter settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSettings {
    /// Shards for a newly used counter (default: 20)
    #[serde(default = "default_num_shards")]
    pub default_num_shards: usize,

    /// Cached total lifetime in seconds (default: 60)
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

fn default_num_shards() -> usize {
    20
}

impl Default for CounterSettings {
    fn default() -> Self {
        Self {
            default_num_shards: default_num_shards(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl CounterSettings {
    pub fn counter_config(&self) -> CounterConfig {
        CounterConfig {
            default_num_shards: self.default_num_shards,
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
        }
    }
}

/// Process-wide settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Detailed 500 bodies (default: true)
    #[serde(default = "default_debug")]
    pub debug: bool,

    #[serde(default)]
    pub http: HttpServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub error_reporting: ErrorReportingConfig,

    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub counter: CounterSettings,
}

fn default_debug() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: default_debug(),
            http: HttpServerConfig::default(),
            logging: LoggingConfig::default(),
            error_reporting: ErrorReportingConfig::default(),
            api: ApiSettings::default(),
            counter: CounterSettings::default(),
        }
    }
}

impl Settings {
    /// Defaults overlaid by `path` when given, validated
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let settings = match path {
            Some(path) => {
                let raw = fs::read_to_string(path).map_err(|e| ConfigError::Io {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
                Self::from_json(&raw)?
            }
            None => Self::default(),
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Defaults overlaid by a JSON document, not yet validated
    pub fn from_json(raw: &str) -> ConfigResult<Self> {
        serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.http.bind_addr().is_none() {
            return Err(ConfigError::invalid(
                "http.host",
                format!("cannot bind {}", self.http.socket_addr()),
            ));
        }
        if self.http.port == 0 {
            return Err(ConfigError::invalid("http.port", "must be non-zero"));
        }
        if self.api.default_page_size == 0 {
            return Err(ConfigError::invalid("api.default_page_size", "must be at least 1"));
        }
        if self.api.max_page_size < self.api.default_page_size {
            return Err(ConfigError::invalid(
                "api.max_page_size",
                "must not be below api.default_page_size",
            ));
        }
        if self.counter.default_num_shards == 0 {
            return Err(ConfigError::invalid("counter.default_num_shards", "must be at least 1"));
        }
        if self.error_reporting.enabled
            && self.error_reporting.dsn.as_deref().map_or(true, str::is_empty)
        {
            return Err(ConfigError::invalid(
                "error_reporting.dsn",
                "required when error reporting is enabled",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert!(settings.debug);
        assert_eq!(settings.api.default_page_size, 20);
        assert_eq!(settings.counter.default_num_shards, 20);
    }

    #[test]
    fn test_partial_file_overlays_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"debug": false, "http": {{"port": 9000}}, "api": {{"default_page_size": 5}}}}"#)
            .unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert!(!settings.debug);
        assert_eq!(settings.http.port, 9000);
        assert_eq!(settings.http.host, "0.0.0.0");
        assert_eq!(settings.api.default_page_size, 5);
        assert_eq!(settings.api.max_page_size, 1000);
    }

    #[test]
    fn test_missing_file() {
        let err = Settings::load(Some(Path::new("/nonexistent/gantry.json"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_validation_failures() {
        let cases = [
            r#"{"api": {"default_page_size": 0}}"#,
            r#"{"api": {"default_page_size": 50, "max_page_size": 10}}"#,
            r#"{"counter": {"default_num_shards": 0}}"#,
            r#"{"error_reporting": {"enabled": true}}"#,
            r#"{"http": {"host": "nowhere"}}"#,
        ];
        for raw in cases {
            let settings = Settings::from_json(raw).unwrap();
            assert!(
                matches!(settings.validate(), Err(ConfigError::Invalid { .. })),
                "{}",
                raw
            );
        }
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(Settings::from_json("{nope"), Err(ConfigError::Parse(_))));
    }
}
