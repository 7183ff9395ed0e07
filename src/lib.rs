//! gantry - cached, paginated REST resources over a document store
//!
//! Handlers are configured once per route and serve list, fetch, create,
//! update and delete over an entity kind or a fixed sequence. Lists are
//! filtered and ordered from query parameters, paged by offset or cursor
//! and optionally cached with registry-backed invalidation. Sharded
//! counters share the same store and cache.

pub mod app;
pub mod cache;
pub mod cli;
pub mod codec;
pub mod config;
pub mod counter;
pub mod http_server;
pub mod observability;
pub mod paginate;
pub mod query;
pub mod rest_api;
pub mod store;
