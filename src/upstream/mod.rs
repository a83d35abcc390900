//! Client for the OpenRouter billing endpoints.
//!
//! Two read-only endpoints are queried per dashboard request: the account
//! credits summary and the metadata of the API key in use. Each call is
//! independent; [`OpenRouterClient::fetch_optional`] turns any failure into
//! "no data from that source" so the caller can combine partial results.

use std::fmt;

use http::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::Value;

/// Longest upstream error body kept in an [`UpstreamError::Status`].
const MAX_ERROR_BODY_CHARS: usize = 512;

/// The billing API endpoints queried for the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillingEndpoint {
    /// `GET /credits`: total credits purchased and used.
    Credits,
    /// `GET /api-keys/current`: limit, usage counters and models of the key.
    KeyInfo,
}

impl BillingEndpoint {
    pub fn path(&self) -> &'static str {
        match self {
            BillingEndpoint::Credits => "credits",
            BillingEndpoint::KeyInfo => "api-keys/current",
        }
    }
}

impl fmt::Display for BillingEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BillingEndpoint::Credits => f.write_str("credits"),
            BillingEndpoint::KeyInfo => f.write_str("key_info"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("{endpoint} request failed: {source}")]
    Transport {
        endpoint: BillingEndpoint,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: BillingEndpoint,
        status: u16,
        body: String,
    },

    #[error("{endpoint} returned an undecodable body: {source}")]
    Decode {
        endpoint: BillingEndpoint,
        #[source]
        source: reqwest::Error,
    },
}

/// Authenticated client for the billing API.
///
/// Cheap to clone: the inner `reqwest::Client` shares its connection pool.
#[derive(Clone)]
pub struct OpenRouterClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl fmt::Debug for OpenRouterClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenRouterClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl OpenRouterClient {
    pub fn new(http: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            api_key: api_key.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: BillingEndpoint) -> String {
        format!("{}/{}", self.base_url, endpoint.path())
    }

    /// Fetch one endpoint and decode its JSON body.
    pub async fn fetch(&self, endpoint: BillingEndpoint) -> Result<Value, UpstreamError> {
        let response = self
            .http
            .get(self.url(endpoint))
            .bearer_auth(&self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|source| UpstreamError::Transport { endpoint, source })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                endpoint,
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|source| UpstreamError::Decode { endpoint, source })
    }

    /// Fetch one endpoint, degrading every failure to `None`.
    ///
    /// A JSON `null` body also counts as no data.
    pub async fn fetch_optional(&self, endpoint: BillingEndpoint) -> Option<Value> {
        match self.fetch(endpoint).await {
            Ok(Value::Null) => {
                tracing::warn!(endpoint = %endpoint, "Billing endpoint returned null");
                None
            }
            Ok(payload) => {
                tracing::debug!(endpoint = %endpoint, payload = %payload, "Billing data received");
                Some(payload)
            }
            Err(e) => {
                tracing::warn!(endpoint = %endpoint, error = %e, "Billing endpoint failed");
                None
            }
        }
    }
}
