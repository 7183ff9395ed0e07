//! # HTTP Server
//!
//! Main HTTP server combining the health check with every mounted
//! resource router, wrapped in CORS, request tracing and the
//! Cache-Control rewrite.

use std::io;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::CACHE_CONTROL, HeaderValue},
    middleware::map_response_with_state,
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::config::HttpServerConfig;
use super::counter_routes::{counter_routes, CounterState};
use super::health_routes::health_routes;

/// HTTP Server for gantry applications
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with default configuration
    pub fn new() -> Self {
        Self::with_config(HttpServerConfig::default())
    }

    /// Create a new HTTP server with custom configuration
    pub fn with_config(config: HttpServerConfig) -> Self {
        Self {
            config,
            router: health_routes(),
        }
    }

    /// Mount routes that carry their own full paths
    pub fn mount(mut self, routes: Router) -> Self {
        self.router = self.router.merge(routes);
        self
    }

    /// Mount the counter routes under `/counter`
    pub fn mount_counter(mut self, state: Arc<CounterState>) -> Self {
        self.router = self.router.nest("/counter", counter_routes(state));
        self
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    fn cors(&self) -> CorsLayer {
        let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
        if self.config.cors_origins.is_empty() {
            cors.allow_origin(Any)
        } else {
            let origins: Vec<HeaderValue> = self
                .config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();
            cors.allow_origin(AllowOrigin::list(origins))
        }
    }

    /// The finished router with every layer applied
    pub fn router(self) -> Router {
        let cors = self.cors();
        self.router
            .layer(map_response_with_state(
                self.config.cache_control_max_age,
                rewrite_cache_control,
            ))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Start the HTTP server (async)
    pub async fn start(self) -> io::Result<()> {
        let addr = self.config.bind_addr().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid socket address {}", self.config.socket_addr()),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;
        info!(%addr, "gantry HTTP server listening");
        axum::serve(listener, self.router()).await
    }
}

impl Default for HttpServer {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn `Cache-Control: no-cache` into a public, cacheable response
async fn rewrite_cache_control(State(max_age): State<u64>, mut response: Response) -> Response {
    let no_cache = response
        .headers()
        .get(CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.split(',').any(|d| d.trim().eq_ignore_ascii_case("no-cache")));
    if no_cache {
        if let Ok(value) = HeaderValue::from_str(&format!("public, max-age={}", max_age)) {
            response.headers_mut().insert(CACHE_CONTROL, value);
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use tower::ServiceExt;

    #[test]
    fn test_server_with_custom_port() {
        let server = HttpServer::with_config(HttpServerConfig::with_port(9090));
        assert_eq!(server.socket_addr(), "0.0.0.0:9090");
    }

    #[tokio::test]
    async fn test_health() {
        let router = HttpServer::new().router();
        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_no_cache_is_rewritten() {
        let routes = Router::new()
            .route("/fresh", get(|| async { ([(CACHE_CONTROL, "no-cache")], "x") }))
            .route("/private", get(|| async { ([(CACHE_CONTROL, "private")], "x") }));
        let router = HttpServer::new().mount(routes).router();

        let response = router
            .clone()
            .oneshot(Request::builder().uri("/fresh").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(
            response.headers().get(CACHE_CONTROL).unwrap(),
            "public, max-age=600"
        );

        let response = router
            .oneshot(Request::builder().uri("/private").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.headers().get(CACHE_CONTROL).unwrap(), "private");
    }
}
