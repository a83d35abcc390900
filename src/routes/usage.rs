use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use serde::Deserialize;

use super::UsageError;
use crate::{
    AppState,
    upstream::BillingEndpoint,
    usage::{Payloads, UsageSnapshot},
};

const DEFAULT_DAYS: i64 = 7;

/// Query parameters for the usage endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct UsageQuery {
    /// Reporting window in days. Accepted for frontend compatibility; the
    /// billing API only exposes account-wide totals.
    pub days: Option<String>,
}

impl UsageQuery {
    /// `days` as an integer, falling back to 7 when absent or unparsable.
    pub fn days(&self) -> i64 {
        self.days
            .as_deref()
            .and_then(|d| d.trim().parse().ok())
            .unwrap_or(DEFAULT_DAYS)
    }
}

/// Aggregated OpenRouter usage for the dashboard.
///
/// Queries the credits and key-info endpoints; either one failing is
/// tolerated, both failing is an error.
#[tracing::instrument(name = "usage.openrouter", skip_all, fields(days = tracing::field::Empty))]
pub async fn openrouter_usage(
    State(state): State<AppState>,
    query: Result<Query<UsageQuery>, QueryRejection>,
) -> Result<Json<UsageSnapshot>, UsageError> {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Ignoring malformed query string");
            UsageQuery::default()
        }
    };
    tracing::Span::current().record("days", query.days());

    let Some(client) = state.billing.as_ref() else {
        tracing::error!(
            env = %state.config.upstream.api_key_env,
            "OpenRouter API key not configured"
        );
        return Err(UsageError::NotConfigured);
    };

    tracing::info!("Fetching real-time usage from OpenRouter");
    let (credits, key_info) = tokio::join!(
        client.fetch_optional(BillingEndpoint::Credits),
        client.fetch_optional(BillingEndpoint::KeyInfo),
    );

    if credits.is_none() && key_info.is_none() {
        tracing::error!("No billing data from either OpenRouter endpoint");
        return Err(UsageError::UpstreamUnavailable);
    }

    let payloads = Payloads::new(credits.as_ref(), key_info.as_ref());
    let snapshot = UsageSnapshot::build(
        &payloads,
        state.config.dashboard.now(),
        state.config.upstream.default_limit,
    );

    tracing::info!(
        has_credits = credits.is_some(),
        has_key_info = key_info.is_some(),
        total_cost = snapshot.total_cost,
        total_requests = snapshot.total_requests,
        models = snapshot.model_usage.len(),
        "Usage snapshot built"
    );

    Ok(Json(snapshot))
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header, method, path},
    };

    use super::*;
    use crate::{build_app, config::AppConfig};

    fn test_config(server: &MockServer, api_key: Option<&str>) -> AppConfig {
        let mut config = AppConfig::default();
        config.upstream.base_url = format!("{}/api/v1", server.uri());
        config.upstream.api_key = api_key.map(str::to_string);
        // Point the env fallback at a variable no test sets.
        config.upstream.api_key_env = "OPENROUTER_USAGE_ROUTE_TEST_UNSET".to_string();
        config.dashboard.utc_offset_minutes = Some(540);
        config
    }

    fn test_app(config: AppConfig) -> Router {
        build_app(AppState::new(config).unwrap())
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn mount_credits(server: &MockServer, body: Value) {
        Mock::given(method("GET"))
            .and(path("/api/v1/credits"))
            .and(header("authorization", "Bearer sk-or-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    async fn mount_key_info(server: &MockServer, template: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path("/api/v1/api-keys/current"))
            .and(header("authorization", "Bearer sk-or-test"))
            .respond_with(template)
            .mount(server)
            .await;
    }

    fn strip_timestamps(mut value: Value) -> Value {
        value["lastUpdated"] = Value::Null;
        value["currentSession"]["lastUsed"] = Value::Null;
        value["daily_usage"][0]["date"] = Value::Null;
        if let Some(entries) = value["modelUsage"].as_array_mut() {
            for entry in entries {
                entry["lastUsed"] = Value::Null;
            }
        }
        value
    }

    #[test]
    fn test_days_parsing() {
        let query = |days: Option<&str>| UsageQuery {
            days: days.map(str::to_string),
        };
        assert_eq!(query(None).days(), 7);
        assert_eq!(query(Some("30")).days(), 30);
        assert_eq!(query(Some(" 14 ")).days(), 14);
        assert_eq!(query(Some("abc")).days(), 7);
    }

    #[tokio::test]
    async fn test_missing_credential_makes_no_upstream_calls() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let app = test_app(test_config(&server, None));
        let (status, body) = get_json(app, "/api/openrouter/usage").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "OpenRouter API key not configured"}));
        server.verify().await;
    }

    #[tokio::test]
    async fn test_both_sources_failing_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/credits"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;
        mount_key_info(&server, ResponseTemplate::new(200).set_body_string("not json")).await;

        let app = test_app(test_config(&server, Some("sk-or-test")));
        let (status, body) = get_json(app, "/api/openrouter/usage").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({"error": "Failed to fetch any real data from OpenRouter API"})
        );
    }

    #[tokio::test]
    async fn test_credits_only() {
        let server = MockServer::start().await;
        mount_credits(
            &server,
            json!({"data": {"total_credits": 10, "total_usage": 2}}),
        )
        .await;
        mount_key_info(&server, ResponseTemplate::new(404)).await;

        let app = test_app(test_config(&server, Some("sk-or-test")));
        let (status, body) = get_json(app, "/api/openrouter/usage?days=30").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["currentSession"]["totalCost"], 2.0);
        assert_eq!(body["currentSession"]["primaryModel"], "unknown");
        assert_eq!(body["accountInfo"]["limit"], 25.0);
        assert_eq!(body["accountInfo"]["limitRemaining"], 23.0);
        assert_eq!(body["accountInfo"]["balance"], 10.0);
        assert_eq!(body["modelUsage"], json!([]));
        assert_eq!(body["total_cost"], 2.0);
    }

    #[tokio::test]
    async fn test_key_info_only() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/credits"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        mount_key_info(
            &server,
            ResponseTemplate::new(200).set_body_json(json!({
                "limit": 40,
                "total_requests": 12,
                "models": ["openai/gpt-4-turbo"]
            })),
        )
        .await;

        let app = test_app(test_config(&server, Some("sk-or-test")));
        let (status, body) = get_json(app, "/api/openrouter/usage").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_cost"], 0.0);
        assert_eq!(body["total_requests"], 12);
        assert_eq!(body["accountInfo"]["limit"], 40.0);
        assert_eq!(body["modelUsage"][0]["tier"], "balanced");
        assert_eq!(body["modelUsage"][0]["isActive"], false);
        assert_eq!(body["top_models"][0]["model"], "openai/gpt-4-turbo");
    }

    #[tokio::test]
    async fn test_malformed_query_is_ignored() {
        let server = MockServer::start().await;
        mount_credits(&server, json!({"usage": 1})).await;
        mount_key_info(&server, ResponseTemplate::new(500)).await;

        let app = test_app(test_config(&server, Some("sk-or-test")));
        let (status, body) = get_json(app, "/api/openrouter/usage?days=abc&days=3").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["currentSession"]["totalCost"], 1.0);
    }

    #[tokio::test]
    async fn test_repeated_requests_differ_only_in_timestamps() {
        let server = MockServer::start().await;
        mount_credits(
            &server,
            json!({"data": {"total_credits": 10, "total_usage": 2.5}}),
        )
        .await;
        mount_key_info(
            &server,
            ResponseTemplate::new(200).set_body_json(json!({
                "total_requests": 42,
                "total_tokens": 1000,
                "is_free_tier": false,
                "models": ["mistralai/mistral-large", "anthropic/claude-3-opus"],
                "rate_limit": {"requests": 10, "interval": "10s"}
            })),
        )
        .await;

        let config = test_config(&server, Some("sk-or-test"));
        let (_, first) = get_json(test_app(config.clone()), "/api/openrouter/usage").await;
        let (_, second) = get_json(test_app(config), "/api/openrouter/usage").await;

        assert_eq!(first["modelUsage"][0]["tier"], "budget");
        assert_eq!(first["modelUsage"][1]["tier"], "premium");
        assert_eq!(first["accountInfo"]["rateLimit"]["requests"], 10);
        assert_eq!(strip_timestamps(first), strip_timestamps(second));
    }
}
