//! # API Handler
//!
//! A paginated, filterable, optionally cached REST resource over one
//! entity kind or a fixed in-memory sequence.
//!
//! GET without a `page` parameter on a kind pages by cursor; with `page`
//! (and always for in-memory sequences) it pages by offset. Every POST or
//! DELETE flushes all cache entries the handler ever registered.
//!
//! A `key` parameter on the collection path is a single-entity lookup.
//! Single-entity responses are cached under `<prefix>/entity`, apart from
//! every list key.

use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use crate::cache::{build_cache_key, Cache, CacheKeyRegistry};
use crate::codec::{apply_json, entity_to_json, parse_body, KEY_FIELD};
use crate::paginate::{ItemCount, Paginator, StoreCount};
use crate::query::{
    QueryCompiler, QueryParams, CURSOR_PARAM, KEY_PARAM, PAGE_PARAM, PAGE_SIZE_PARAM,
};
use crate::store::{Cursor, DocumentStore, Entity, Key, KindSchema, Query};

use super::config::{ApiHandlerConfig, CachePolicy, DataSource, Method};
use super::errors::{ApiError, ApiResult};
use super::response::{ListResponse, StatusResponse};

/// Prefix clients may put in front of an encoded key
const KEY_REF_PREFIX: &str = "key:";

/// Suffix of the cache prefix for single-entity responses
const ENTITY_NAMESPACE: &str = "/entity";

/// REST handler for one configured resource
pub struct ApiHandler {
    config: ApiHandlerConfig,
    store: Arc<dyn DocumentStore>,
    cache: Arc<dyn Cache>,
    registry: CacheKeyRegistry,
}

impl ApiHandler {
    pub fn new(config: ApiHandlerConfig, store: Arc<dyn DocumentStore>, cache: Arc<dyn Cache>) -> Self {
        let registry = CacheKeyRegistry::new(store.clone(), cache.clone());
        Self {
            config,
            store,
            cache,
            registry,
        }
    }

    pub fn config(&self) -> &ApiHandlerConfig {
        &self.config
    }

    fn ensure_allowed(&self, method: Method) -> ApiResult<()> {
        if self.config.allows(method) {
            Ok(())
        } else {
            Err(ApiError::MethodNotAllowed(method))
        }
    }

    /// Schema for writes; in-memory sequences are read-only
    fn writable_schema(&self, method: Method) -> ApiResult<&KindSchema> {
        match self.config.source() {
            DataSource::Kind { schema, .. } => Ok(schema),
            DataSource::Items(_) => Err(ApiError::MethodNotAllowed(method)),
        }
    }

    // ==================
    // Cache
    // ==================

    fn cached(&self, cache_key: &str) -> Option<JsonValue> {
        match self.cache.get(cache_key) {
            Ok(Some(value)) => {
                debug!(handler = self.config.name(), cache_key, "cache hit");
                Some(value)
            }
            Ok(None) => {
                debug!(handler = self.config.name(), cache_key, "cache miss");
                None
            }
            Err(e) => {
                warn!(handler = self.config.name(), error = %e, "cache read failed, recomputing");
                None
            }
        }
    }

    /// Registry generation seen before computing a response; `None` skips caching
    fn generation(&self) -> Option<i64> {
        match self.registry.generation(self.config.name()) {
            Ok(generation) => Some(generation),
            Err(e) => {
                warn!(handler = self.config.name(), error = %e, "cache registry unreadable, not caching");
                None
            }
        }
    }

    /// Register then write, so every cached entry is flushable
    ///
    /// Nothing is cached if a write flushed the handler after `generation`
    /// was read; an entry written while such a flush ran is deleted again.
    fn remember(&self, policy: &CachePolicy, cache_key: &str, value: &JsonValue, generation: i64) {
        let name = self.config.name();
        match self.registry.register_at(name, cache_key, generation) {
            Ok(true) => {}
            Ok(false) => {
                debug!(handler = name, cache_key, "data changed while computing, not caching");
                return;
            }
            Err(e) => {
                warn!(handler = name, error = %e, "cache key registration failed, not caching");
                return;
            }
        }
        if let Err(e) = self.cache.set(cache_key, value.clone(), policy.ttl) {
            warn!(handler = name, error = %e, "cache write failed");
            return;
        }
        if !matches!(self.registry.is_current(name, generation), Ok(true)) {
            debug!(handler = name, cache_key, "flushed during cache write, dropping entry");
            if let Err(e) = self.cache.delete_multi(&[cache_key.to_string()]) {
                warn!(handler = name, error = %e, "cache delete failed");
            }
        }
    }

    fn invalidate(&self) -> ApiResult<()> {
        if self.config.cache().is_some() {
            self.registry.flush(self.config.name())?;
        }
        Ok(())
    }

    // ==================
    // Reads
    // ==================

    /// Requested page size clamped to `[1, max]`, else the default
    fn page_size(&self, params: &QueryParams) -> usize {
        params
            .get(PAGE_SIZE_PARAM)
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .map(|n| n.clamp(1, self.config.max_page_size()))
            .unwrap_or(self.config.page_size())
    }

    /// Paginator over `source` with the handler's orphan and empty-page rules
    fn paginator<S: ItemCount + ?Sized>(&self, source: &S, page_size: usize) -> ApiResult<Paginator> {
        Ok(Paginator::from_source(source, page_size)?
            .with_orphans(self.config.orphans())
            .with_allow_empty_first_page(self.config.allow_empty_first_page()))
    }

    /// GET on the collection; with a `key` parameter, the bare entity
    pub fn list(&self, path: &str, params: &QueryParams) -> ApiResult<JsonValue> {
        self.ensure_allowed(Method::Get)?;
        if let Some(raw_key) = params.get(KEY_PARAM).filter(|raw| !raw.is_empty()) {
            return self.get_one(raw_key);
        }

        let cache_key = self
            .config
            .cache()
            .map(|policy| (policy, QueryCompiler::cache_key(&policy.prefix, params)));
        if let Some((_, key)) = &cache_key {
            if let Some(hit) = self.cached(key) {
                return Ok(hit);
            }
        }

        let generation = cache_key.as_ref().and_then(|_| self.generation());
        let response = self.build_list(path, params)?;
        let body = serde_json::to_value(&response).map_err(|e| ApiError::Internal(e.to_string()))?;

        if let (Some((policy, key)), Some(generation)) = (&cache_key, generation) {
            self.remember(policy, key, &body, generation);
        }
        Ok(body)
    }

    fn build_list(&self, path: &str, params: &QueryParams) -> ApiResult<ListResponse> {
        let page_size = self.page_size(params);
        match self.config.source() {
            DataSource::Items(items) => {
                let paginator = self.paginator(items.as_slice(), page_size)?;
                let page = paginator.resolve(params.get(PAGE_PARAM))?;
                let feed = page.slice(items.as_slice()).iter().map(entity_to_json).collect();
                Ok(ListResponse::new(feed, Some(page.number()), page_size, paginator.count())
                    .with_pagecount(paginator.num_pages()))
            }
            DataSource::Kind { schema, query } => {
                let query = match query {
                    Some(fixed) => fixed.clone(),
                    None => QueryCompiler::new(schema).compile(params)?,
                };
                if params.get(PAGE_PARAM).is_some() {
                    self.offset_page(&query, params, page_size)
                } else {
                    self.cursor_page(&query, path, params, page_size)
                }
            }
        }
    }

    fn offset_page(&self, query: &Query, params: &QueryParams, page_size: usize) -> ApiResult<ListResponse> {
        let paginator = self.paginator(&StoreCount::new(self.store.as_ref(), query), page_size)?;
        let page = paginator.resolve(params.get(PAGE_PARAM))?;
        let entities = self.store.fetch(query, page.offset(), Some(page.len()))?;
        let feed = entities.iter().map(entity_to_json).collect();
        Ok(ListResponse::new(feed, Some(page.number()), page_size, paginator.count())
            .with_pagecount(paginator.num_pages()))
    }

    fn cursor_page(
        &self,
        query: &Query,
        path: &str,
        params: &QueryParams,
        page_size: usize,
    ) -> ApiResult<ListResponse> {
        let cursor = params
            .get(CURSOR_PARAM)
            .filter(|raw| !raw.is_empty())
            .map(Cursor::new);

        let (entities, next) = self.store.fetch_page(query, cursor.as_ref(), page_size)?;
        let total = self.store.count(query, None)?;
        let feed = entities.iter().map(entity_to_json).collect();

        let response = ListResponse::new(feed, cursor.is_none().then_some(1), page_size, total);
        Ok(match next {
            Some(next) => {
                let next_page = QueryCompiler::next_page_url(path, page_size, &next, params);
                response.with_next(next.as_str().to_string(), next_page)
            }
            None => response,
        })
    }

    /// GET on a single member: an encoded key, or an index for sequences
    pub fn get_one(&self, raw_key: &str) -> ApiResult<JsonValue> {
        self.ensure_allowed(Method::Get)?;

        let schema = match self.config.source() {
            DataSource::Items(items) => {
                return raw_key
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| items.get(index))
                    .map(entity_to_json)
                    .ok_or(ApiError::NotFound);
            }
            DataSource::Kind { schema, .. } => schema,
        };

        let key = resolve_key(schema, raw_key)?;
        let cache_key = self
            .config
            .cache()
            .map(|policy| (policy, entity_cache_key(&policy.prefix, &key)));
        if let Some((_, cache_key)) = &cache_key {
            if let Some(hit) = self.cached(cache_key) {
                return Ok(hit);
            }
        }

        let generation = cache_key.as_ref().and_then(|_| self.generation());
        let entity = self.store.get(&key)?.ok_or(ApiError::NotFound)?;
        let body = entity_to_json(&entity);
        if let (Some((policy, cache_key)), Some(generation)) = (&cache_key, generation) {
            self.remember(policy, cache_key, &body, generation);
        }
        Ok(body)
    }

    // ==================
    // Writes
    // ==================

    /// POST: create without a key, overwrite properties with one
    pub fn post(&self, raw_key: Option<&str>, body: &[u8]) -> ApiResult<JsonValue> {
        self.ensure_allowed(Method::Post)?;
        let schema = self.writable_schema(Method::Post)?;

        let fields = parse_body(body)?;
        if let Some(undeclared) = fields
            .keys()
            .find(|name| name.as_str() != KEY_FIELD && !schema.accepts(name))
        {
            return Err(ApiError::InvalidBody(format!(
                "{} has no property {}",
                schema.kind(),
                undeclared
            )));
        }

        let mut entity = match raw_key {
            Some(raw) => {
                let key = resolve_key(schema, raw)?;
                self.store.get(&key)?.ok_or(ApiError::NotFound)?
            }
            None => Entity::new(schema.kind()),
        };
        apply_json(&mut entity, &fields)?;

        let key = self.store.put(entity.clone())?;
        entity.set_key(key.clone());
        info!(handler = self.config.name(), key = %key, created = raw_key.is_none(), "saved entity");

        self.invalidate()?;
        Ok(entity_to_json(&entity))
    }

    /// DELETE a member by key
    pub fn delete(&self, raw_key: &str) -> ApiResult<StatusResponse> {
        self.ensure_allowed(Method::Delete)?;
        let schema = self.writable_schema(Method::Delete)?;

        let key = resolve_key(schema, raw_key)?;
        if !self.store.delete(&key)? {
            return Err(ApiError::NotFound);
        }
        info!(handler = self.config.name(), key = %key, "deleted entity");

        self.invalidate()?;
        Ok(StatusResponse::ok())
    }
}

/// Cache key of a single-entity response
fn entity_cache_key(prefix: &str, key: &Key) -> String {
    build_cache_key(&format!("{}{}", prefix, ENTITY_NAMESPACE), &[(KEY_FIELD, key.encode())])
}

/// Decode a client-supplied key and check it names an entity of `schema`'s kind
fn resolve_key(schema: &KindSchema, raw: &str) -> ApiResult<Key> {
    let encoded = raw.strip_prefix(KEY_REF_PREFIX).unwrap_or(raw);
    let key = Key::decode(encoded)?;
    if key.kind() != schema.kind() {
        return Err(ApiError::NotFound);
    }
    Ok(key)
}
