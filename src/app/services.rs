//! # Services
//!
//! The collaborators every handler shares, assembled once from settings.

use std::sync::Arc;

use crate::cache::{Cache, MemoryCache};
use crate::config::Settings;
use crate::counter::ShardedCounter;
use crate::http_server::CounterState;
use crate::observability::{reporter_from_config, ErrorReporter};
use crate::rest_api::{ApiHandler, ApiHandlerConfig, ErrorRenderer};
use crate::store::{DocumentStore, MemoryStore};

/// Shared store, cache, reporter and counters
#[derive(Clone)]
pub struct Services {
    pub store: Arc<dyn DocumentStore>,
    pub cache: Arc<dyn Cache>,
    pub reporter: Arc<dyn ErrorReporter>,
    pub counter: Arc<ShardedCounter>,
    debug: bool,
}

impl Services {
    /// Process-local store and cache
    pub fn in_memory(settings: &Settings) -> Self {
        Self::new(
            settings,
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryCache::new()),
            reporter_from_config(&settings.error_reporting),
        )
    }

    pub fn new(
        settings: &Settings,
        store: Arc<dyn DocumentStore>,
        cache: Arc<dyn Cache>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        let counter = Arc::new(ShardedCounter::new(
            store.clone(),
            cache.clone(),
            settings.counter.counter_config(),
        ));
        Self {
            store,
            cache,
            reporter,
            counter,
            debug: settings.debug,
        }
    }

    pub fn renderer(&self) -> ErrorRenderer {
        ErrorRenderer::new(self.debug, self.reporter.clone())
    }

    pub fn api_handler(&self, config: ApiHandlerConfig) -> ApiHandler {
        ApiHandler::new(config, self.store.clone(), self.cache.clone())
    }

    pub fn counter_state(&self) -> Arc<CounterState> {
        Arc::new(CounterState::new(self.counter.clone(), self.renderer()))
    }
}
