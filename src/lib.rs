//! Dashboard backend that turns OpenRouter billing data into a single usage
//! document.
//!
//! One request to `GET /api/openrouter/usage` fans out to the credits and
//! key-info endpoints of the billing API and merges whatever they return into
//! a [`usage::UsageSnapshot`].

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::{catch_panic::CatchPanicLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

pub mod config;
#[cfg(feature = "server")]
pub mod observability;
pub mod routes;
pub mod upstream;
pub mod usage;

use config::AppConfig;
use upstream::OpenRouterClient;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// Billing API client; `None` when no credential is configured.
    pub billing: Option<OpenRouterClient>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, StartupError> {
        let http_client = config.server.http_client.build_client()?;

        tracing::debug!(
            timeout_secs = config.server.http_client.timeout_secs,
            connect_timeout_secs = config.server.http_client.connect_timeout_secs,
            "HTTP client configured"
        );

        let billing = match config.upstream.resolve_api_key() {
            Some(api_key) => Some(OpenRouterClient::new(
                http_client,
                config.upstream.base_url.as_str(),
                api_key,
            )),
            None => {
                tracing::warn!(
                    env = %config.upstream.api_key_env,
                    "No OpenRouter API key configured; usage requests will fail"
                );
                None
            }
        };

        Ok(Self {
            config: Arc::new(config),
            billing,
        })
    }
}

/// Build the router with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    let server = &state.config.server;

    let mut app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/health/live", get(routes::health::liveness))
        .nest("/api", routes::api_routes())
        .layer(CatchPanicLayer::custom(routes::handle_panic))
        .layer(RequestBodyLimitLayer::new(server.body_limit_bytes))
        .layer(TraceLayer::new_for_http());

    if let Some(cors) = server.cors.clone().into_layer() {
        app = app.layer(cors);
    }

    app.with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;

    async fn boom() -> &'static str {
        panic!("upstream payload exploded")
    }

    #[tokio::test]
    async fn test_panicking_handler_yields_error_document() {
        let app: Router = Router::new()
            .route("/boom", get(boom))
            .layer(CatchPanicLayer::custom(routes::handle_panic));

        let response = app
            .oneshot(Request::builder().uri("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Failed to fetch real-time data from OpenRouter");
        assert!(body["lastUpdated"].is_string());
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_only_get() {
        let mut config = AppConfig::default();
        config.upstream.api_key = Some("sk-or-test".to_string());
        config.server.cors.allowed_origins = vec!["http://localhost:5173".to_string()];
        let app = build_app(AppState::new(config).unwrap());

        let response = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/openrouter/usage")
                    .header("origin", "http://localhost:5173")
                    .header("access-control-request-method", "GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(headers["access-control-allow-origin"], "http://localhost:5173");
        assert_eq!(headers["access-control-allow-methods"], "GET");
        assert_eq!(headers["access-control-allow-headers"], "content-type");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let mut config = AppConfig::default();
        config.upstream.api_key = Some("sk-or-test".to_string());
        let app = build_app(AppState::new(config).unwrap());

        let response = app
            .oneshot(Request::builder().uri("/api/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
