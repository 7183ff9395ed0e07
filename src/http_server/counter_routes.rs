//! Counter HTTP Routes
//!
//! `GET /counter/{name}` increments then reads; `GET /counter/{name}/value`
//! only reads.

use std::sync::Arc;

use axum::{
    extract::{OriginalUri, Path, State},
    http::{HeaderMap, Method},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::debug;

use crate::counter::ShardedCounter;
use crate::observability::RequestInfo;
use crate::rest_api::{ApiResult, ErrorRenderer};

// ==================
// Shared State
// ==================

/// Counter state shared across handlers
pub struct CounterState {
    pub counter: Arc<ShardedCounter>,
    pub renderer: ErrorRenderer,
}

impl CounterState {
    pub fn new(counter: Arc<ShardedCounter>, renderer: ErrorRenderer) -> Self {
        Self { counter, renderer }
    }
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: i64,
}

/// Create counter routes, to be nested under `/counter`
pub fn counter_routes(state: Arc<CounterState>) -> Router {
    Router::new()
        .route("/{name}", get(increment_handler))
        .route("/{name}/value", get(value_handler))
        .with_state(state)
}

async fn increment_handler(
    State(state): State<Arc<CounterState>>,
    Path(name): Path<String>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Response {
    let result = increment_and_read(&state.counter, &name);
    match result {
        Ok(count) => Json(CountResponse { count }).into_response(),
        Err(err) => state
            .renderer
            .render(&RequestInfo::from_http(&method, &uri, &headers), err),
    }
}

fn increment_and_read(counter: &ShardedCounter, name: &str) -> ApiResult<i64> {
    counter.increment(name)?;
    let count = counter.get_count(name)?;
    debug!(counter = name, count, "counter incremented");
    Ok(count)
}

async fn value_handler(
    State(state): State<Arc<CounterState>>,
    Path(name): Path<String>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Response {
    match state.counter.get_count(&name) {
        Ok(count) => Json(CountResponse { count }).into_response(),
        Err(err) => state
            .renderer
            .render(&RequestInfo::from_http(&method, &uri, &headers), err.into()),
    }
}
