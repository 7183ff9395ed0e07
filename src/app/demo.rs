//! # Demo Application
//!
//! A `DemoModel` kind served three ways: a dynamic-query resource, a
//! cached fixed-query resource and a memoized clock.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cache::{memoize, Cache, MemoOptions};
use crate::config::{ConfigResult, Settings};
use crate::http_server::HttpServer;
use crate::rest_api::{api_routes, ApiHandlerConfig, Method};
use crate::store::{Entity, FilterOp, KindSchema, Query, StoreResult, Value};

use super::services::Services;

pub const DEMO_KIND: &str = "DemoModel";

const MEMO_NAMESPACE: &str = "demo.memoize";

/// Expando schema; only declared properties are orderable
pub fn demo_schema() -> KindSchema {
    KindSchema::expando(DEMO_KIND, ["name", "randomnum", "created"])
}

/// `randomnum <= 5000 order by randomnum`
pub fn fixed_query() -> Query {
    Query::new(DEMO_KIND)
        .filter("randomnum", FilterOp::Lte, 5000i64)
        .order("randomnum")
}

/// Build the demo server
pub fn demo_server(settings: &Settings, services: &Services) -> ConfigResult<HttpServer> {
    let dynamic = ApiHandlerConfig::dynamic("demo.dynamic", demo_schema())
        .methods([Method::Get, Method::Post, Method::Delete])
        .with_settings(&settings.api)
        .build()?;

    let fixed = ApiHandlerConfig::fixed("demo.fixed", demo_schema(), fixed_query())
        .methods([Method::Get, Method::Post])
        .cache("demo-api", settings.api.default_cache_ttl())
        .with_settings(&settings.api)
        .build()?;

    let memo = Router::new()
        .route("/demo/memoize", get(memo_handler))
        .with_state(MemoState {
            cache: services.cache.clone(),
            options: MemoOptions::ttl(settings.api.default_cache_ttl()),
        });

    Ok(HttpServer::with_config(settings.http.clone())
        .mount(api_routes("/demo/dynamic", services.api_handler(dynamic), services.renderer()))
        .mount(api_routes("/demo/fixed", services.api_handler(fixed), services.renderer()))
        .mount(memo)
        .mount_counter(services.counter_state()))
}

/// Insert `count` demo entities with random `randomnum` in `[0, 10000)`
pub fn seed_demo(services: &Services, count: usize) -> StoreResult<()> {
    let mut rng = rand::thread_rng();
    for i in 0..count {
        let entity = Entity::new(DEMO_KIND)
            .with("name", format!("demo {}", i))
            .with("randomnum", rng.gen_range(0..10_000i64))
            .with("created", Value::DateTime(Utc::now().fixed_offset()));
        services.store.put(entity)?;
    }
    info!(count, "seeded demo entities");
    Ok(())
}

#[derive(Clone)]
struct MemoState {
    cache: Arc<dyn Cache>,
    options: MemoOptions,
}

#[derive(Debug, Serialize, Deserialize)]
struct TimeResponse {
    time: String,
}

async fn memo_handler(State(state): State<MemoState>) -> impl IntoResponse {
    let args: [(&str, &str); 0] = [];
    let result = memoize(state.cache.as_ref(), MEMO_NAMESPACE, &args, &state.options, || {
        Ok::<_, Infallible>(TimeResponse {
            time: Utc::now().naive_utc().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
        })
    });
    match result {
        Ok(body) => Json(body),
        Err(never) => match never {},
    }
}
