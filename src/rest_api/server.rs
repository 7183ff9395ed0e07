//! # REST API HTTP Routes
//!
//! Axum routes for one [`ApiHandler`]. The handler core is synchronous;
//! routes only translate between HTTP and it.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{OriginalUri, Path, State},
    http::{HeaderMap, Method, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use crate::observability::RequestInfo;
use crate::query::QueryParams;

use super::errors::{ApiResult, ErrorRenderer};
use super::handler::ApiHandler;

/// Shared state of one resource's routes
pub struct ApiState {
    handler: ApiHandler,
    renderer: ErrorRenderer,
}

type SharedState = Arc<ApiState>;

impl ApiState {
    pub fn new(handler: ApiHandler, renderer: ErrorRenderer) -> Self {
        Self { handler, renderer }
    }

    pub fn handler(&self) -> &ApiHandler {
        &self.handler
    }

    fn respond<T: IntoResponse>(
        &self,
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
        result: ApiResult<T>,
    ) -> Response {
        match result {
            Ok(body) => body.into_response(),
            Err(err) => self
                .renderer
                .render(&RequestInfo::from_http(method, uri, headers), err),
        }
    }
}

/// Routes `<path>` (GET, POST) and `<path>/{key}` (GET, POST, DELETE)
pub fn api_routes(path: &str, handler: ApiHandler, renderer: ErrorRenderer) -> Router {
    let state = Arc::new(ApiState::new(handler, renderer));
    let collection = format!("/{}", path.trim_matches('/'));
    let member = format!("{}/{{key}}", collection);

    Router::new()
        .route(&collection, get(list_handler).post(create_handler))
        .route(
            &member,
            get(get_handler).post(update_handler).delete(delete_handler),
        )
        .with_state(state)
}

async fn list_handler(
    State(state): State<SharedState>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Response {
    let params = QueryParams::parse(uri.query().unwrap_or_default());
    let result = state.handler.list(uri.path(), &params).map(Json);
    state.respond(&method, &uri, &headers, result)
}

async fn get_handler(
    State(state): State<SharedState>,
    Path(key): Path<String>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Response {
    let result = state.handler.get_one(&key).map(Json);
    state.respond(&method, &uri, &headers, result)
}

async fn create_handler(
    State(state): State<SharedState>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let result = state.handler.post(None, &body).map(Json);
    state.respond(&method, &uri, &headers, result)
}

async fn update_handler(
    State(state): State<SharedState>,
    Path(key): Path<String>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let result = state.handler.post(Some(&key), &body).map(Json);
    state.respond(&method, &uri, &headers, result)
}

async fn delete_handler(
    State(state): State<SharedState>,
    Path(key): Path<String>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Response {
    let result = state.handler.delete(&key).map(Json);
    state.respond(&method, &uri, &headers, result)
}
