//! # API Handler Configuration
//!
//! Immutable per-route configuration, assembled with a builder and
//! validated once at registration.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{ApiSettings, ConfigError, ConfigResult};
use crate::store::{Entity, KindSchema, Query};

/// HTTP methods a handler can serve
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a handler's entities come from
#[derive(Debug, Clone)]
pub enum DataSource {
    /// Entities of one kind; `query` fixes the list query, otherwise it is
    /// compiled from request parameters
    Kind {
        schema: KindSchema,
        query: Option<Query>,
    },
    /// A fixed in-memory sequence, addressed by index
    Items(Arc<Vec<Entity>>),
}

/// Response caching
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    pub prefix: String,
    pub ttl: Duration,
}

/// Configuration of one API handler
#[derive(Debug, Clone)]
pub struct ApiHandlerConfig {
    name: String,
    source: DataSource,
    methods: BTreeSet<Method>,
    cache: Option<CachePolicy>,
    page_size: usize,
    max_page_size: usize,
    orphans: usize,
    allow_empty_first_page: bool,
}

impl ApiHandlerConfig {
    /// Entities of a kind, list query compiled per request
    pub fn dynamic(name: impl Into<String>, schema: KindSchema) -> ApiHandlerConfigBuilder {
        ApiHandlerConfigBuilder::new(name.into(), DataSource::Kind { schema, query: None })
    }

    /// Entities of a kind, listed through a fixed query
    pub fn fixed(name: impl Into<String>, schema: KindSchema, query: Query) -> ApiHandlerConfigBuilder {
        ApiHandlerConfigBuilder::new(
            name.into(),
            DataSource::Kind {
                schema,
                query: Some(query),
            },
        )
    }

    /// A fixed in-memory sequence
    pub fn items(name: impl Into<String>, items: Vec<Entity>) -> ApiHandlerConfigBuilder {
        ApiHandlerConfigBuilder::new(name.into(), DataSource::Items(Arc::new(items)))
    }

    /// Handler identity, used as its cache registry key
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &DataSource {
        &self.source
    }

    pub fn allows(&self, method: Method) -> bool {
        self.methods.contains(&method)
    }

    pub fn methods(&self) -> impl Iterator<Item = Method> + '_ {
        self.methods.iter().copied()
    }

    pub fn cache(&self) -> Option<&CachePolicy> {
        self.cache.as_ref()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn max_page_size(&self) -> usize {
        self.max_page_size
    }

    /// Largest last page merged into the page before it
    pub fn orphans(&self) -> usize {
        self.orphans
    }

    pub fn allow_empty_first_page(&self) -> bool {
        self.allow_empty_first_page
    }
}

/// Builder for [`ApiHandlerConfig`]
#[derive(Debug, Clone)]
pub struct ApiHandlerConfigBuilder {
    name: String,
    source: DataSource,
    methods: BTreeSet<Method>,
    cache: Option<CachePolicy>,
    page_size: usize,
    max_page_size: usize,
    orphans: usize,
    allow_empty_first_page: bool,
}

impl ApiHandlerConfigBuilder {
    fn new(name: String, source: DataSource) -> Self {
        let defaults = ApiSettings::default();
        Self {
            name,
            source,
            methods: BTreeSet::from([Method::Get]),
            cache: None,
            page_size: defaults.default_page_size,
            max_page_size: defaults.max_page_size,
            orphans: 0,
            allow_empty_first_page: true,
        }
    }

    /// Replace the allowed methods (default: GET only)
    pub fn methods<I: IntoIterator<Item = Method>>(mut self, methods: I) -> Self {
        self.methods = methods.into_iter().collect();
        self
    }

    /// Enable response caching under `prefix`
    pub fn cache(mut self, prefix: impl Into<String>, ttl: Duration) -> Self {
        self.cache = Some(CachePolicy {
            prefix: prefix.into(),
            ttl,
        });
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn max_page_size(mut self, max_page_size: usize) -> Self {
        self.max_page_size = max_page_size;
        self
    }

    /// Merge a last page of `orphans` items or fewer into the previous one
    pub fn orphans(mut self, orphans: usize) -> Self {
        self.orphans = orphans;
        self
    }

    /// Whether an empty collection still serves page 1 (default: true)
    pub fn allow_empty_first_page(mut self, allow: bool) -> Self {
        self.allow_empty_first_page = allow;
        self
    }

    /// Take page size defaults from settings
    pub fn with_settings(self, settings: &ApiSettings) -> Self {
        self.page_size(settings.default_page_size)
            .max_page_size(settings.max_page_size)
    }

    pub fn build(self) -> ConfigResult<ApiHandlerConfig> {
        let invalid = |message: &str| Err(ConfigError::handler(self.name.clone(), message));

        if self.name.is_empty() {
            return invalid("handler name is empty");
        }
        if self.methods.is_empty() {
            return invalid("no methods allowed");
        }
        if self.page_size == 0 {
            return invalid("page size must be at least 1");
        }
        if self.max_page_size < self.page_size {
            return invalid("max page size is below the page size");
        }
        if self.orphans >= self.page_size {
            return invalid("orphans must be below the page size");
        }
        if self.cache.as_ref().is_some_and(|c| c.prefix.is_empty()) {
            return invalid("caching requires a key prefix");
        }
        if let DataSource::Kind {
            schema,
            query: Some(query),
        } = &self.source
        {
            if query.kind() != schema.kind() {
                return invalid("fixed query targets a different kind");
            }
        }

        Ok(ApiHandlerConfig {
            name: self.name,
            source: self.source,
            methods: self.methods,
            cache: self.cache,
            page_size: self.page_size,
            max_page_size: self.max_page_size,
            orphans: self.orphans,
            allow_empty_first_page: self.allow_empty_first_page,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> KindSchema {
        KindSchema::new("Post", ["title"])
    }

    #[test]
    fn test_defaults() {
        let config = ApiHandlerConfig::dynamic("Posts", schema()).build().unwrap();
        assert!(config.allows(Method::Get));
        assert!(!config.allows(Method::Post));
        assert!(config.cache().is_none());
        assert_eq!(config.page_size(), 20);
        assert_eq!(config.max_page_size(), 1000);
    }

    #[test]
    fn test_rejects_invalid() {
        assert!(ApiHandlerConfig::dynamic("Posts", schema())
            .methods([])
            .build()
            .is_err());
        assert!(ApiHandlerConfig::dynamic("Posts", schema())
            .page_size(0)
            .build()
            .is_err());
        assert!(ApiHandlerConfig::dynamic("Posts", schema())
            .cache("", Duration::from_secs(60))
            .build()
            .is_err());
        assert!(ApiHandlerConfig::dynamic("Posts", schema())
            .page_size(5)
            .orphans(5)
            .build()
            .is_err());
        assert!(ApiHandlerConfig::fixed("Posts", schema(), Query::new("Other"))
            .build()
            .is_err());
    }

    #[test]
    fn test_builder_settings() {
        let config = ApiHandlerConfig::items("Static", Vec::new())
            .methods([Method::Get, Method::Post])
            .cache("static", Duration::from_secs(5))
            .page_size(3)
            .orphans(1)
            .allow_empty_first_page(false)
            .build()
            .unwrap();
        assert_eq!(config.orphans(), 1);
        assert!(!config.allow_empty_first_page());
        assert_eq!(config.methods().collect::<Vec<_>>(), vec![Method::Get, Method::Post]);
        assert_eq!(config.cache().map(|c| c.prefix.as_str()), Some("static"));
        assert_eq!(config.page_size(), 3);
    }
}
