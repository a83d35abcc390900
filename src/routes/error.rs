use std::any::Any;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::usage::iso_timestamp;

/// Failures of the usage endpoint. The display text is the `error` field of
/// the response document.
#[derive(Debug, thiserror::Error)]
pub enum UsageError {
    /// No bearer credential is configured; no upstream call was attempted.
    #[error("OpenRouter API key not configured")]
    NotConfigured,

    /// Neither billing endpoint produced data.
    #[error("Failed to fetch any real data from OpenRouter API")]
    UpstreamUnavailable,

    /// Any other fault while serving the request.
    #[error("Failed to fetch real-time data from OpenRouter")]
    Internal,
}

/// Error body returned by the usage endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDocument {
    pub error: String,
    #[serde(
        rename = "lastUpdated",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_updated: Option<String>,
}

impl IntoResponse for UsageError {
    fn into_response(self) -> Response {
        let last_updated = match self {
            UsageError::Internal => Some(iso_timestamp(&Utc::now().fixed_offset())),
            UsageError::NotConfigured | UsageError::UpstreamUnavailable => None,
        };

        let body = ErrorDocument {
            error: self.to_string(),
            last_updated,
        };

        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

/// Panic handler for `CatchPanicLayer`: logs the panic and answers with the
/// generic internal error document.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };
    tracing::error!(panic = %message, "Request handler panicked");

    UsageError::Internal.into_response()
}
