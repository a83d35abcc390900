//! Health check endpoints for container probes and monitoring.

use axum::{Json, extract::State, response::IntoResponse};
use http::StatusCode;
use serde::Serialize;

use crate::AppState;

/// Health status response.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    /// "healthy", or "degraded" when no billing credential is configured
    pub status: &'static str,
    /// Service version
    pub version: &'static str,
    /// Billing API status
    pub upstream: UpstreamStatus,
}

#[derive(Debug, Serialize)]
pub struct UpstreamStatus {
    pub base_url: String,
    pub credential_configured: bool,
}

/// Service health including whether the billing credential is present.
///
/// A missing credential is reported as degraded rather than unhealthy: the
/// process is fine, but the usage endpoint will answer with an error.
#[tracing::instrument(name = "health.check", skip(state))]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let credential_configured = state.billing.is_some();

    let health = HealthStatus {
        status: if credential_configured {
            "healthy"
        } else {
            "degraded"
        },
        version: env!("CARGO_PKG_VERSION"),
        upstream: UpstreamStatus {
            base_url: match &state.billing {
                Some(client) => client.base_url().to_string(),
                None => state.config.upstream.base_url.clone(),
            },
            credential_configured,
        },
    };

    (StatusCode::OK, Json(health))
}

/// Liveness probe. Always 200 while the process can serve requests.
#[tracing::instrument(name = "health.liveness")]
pub async fn liveness() -> impl IntoResponse {
    StatusCode::OK
}
