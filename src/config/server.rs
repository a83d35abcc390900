use std::{net::IpAddr, time::Duration};

use http::{HeaderValue, Method, header::CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request body size limit in bytes.
    /// The dashboard endpoints only accept `GET`, so this stays small.
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,

    /// CORS configuration.
    #[serde(default)]
    pub cors: CorsConfig,

    /// HTTP client configuration for outbound requests to the billing API.
    #[serde(default)]
    pub http_client: HttpClientConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
            cors: CorsConfig::default(),
            http_client: HttpClientConfig::default(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    3000
}

fn default_body_limit() -> usize {
    64 * 1024 // 64 KB
}

/// Preflight responses are cached by browsers for this long.
const CORS_MAX_AGE: Duration = Duration::from_secs(60 * 60);

/// CORS configuration for browser dashboards hosted on another origin.
///
/// The API is read-only, so only the origins are configurable: methods are
/// fixed to `GET` and the only request header allowed is `Content-Type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorsConfig {
    #[serde(default = "default_cors_enabled")]
    pub enabled: bool,

    /// Dashboard origins allowed to read the API. `["*"]` allows any origin;
    /// an empty list rejects every cross-origin request.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: default_cors_enabled(),
            allowed_origins: Vec::new(),
        }
    }
}

impl CorsConfig {
    /// `None` when disabled. Origins that are not valid header values are
    /// logged and dropped.
    pub fn into_layer(self) -> Option<CorsLayer> {
        if !self.enabled {
            return None;
        }

        let allow_origin = match self.allowed_origins.as_slice() {
            [any] if any == "*" => {
                tracing::warn!("Usage API readable from any origin");
                AllowOrigin::any()
            }
            origins => AllowOrigin::list(origins.iter().filter_map(|origin| {
                match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!(origin = %origin, "Ignoring invalid dashboard origin");
                        None
                    }
                }
            })),
        };

        Some(
            CorsLayer::new()
                .allow_origin(allow_origin)
                .allow_methods([Method::GET])
                .allow_headers([CONTENT_TYPE])
                .max_age(CORS_MAX_AGE),
        )
    }
}

fn default_cors_enabled() -> bool {
    true
}

/// Outbound client used for the billing API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpClientConfig {
    /// Total time allowed per billing request, connection included.
    #[serde(default = "default_http_client_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_http_client_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_http_client_timeout(),
            connect_timeout_secs: default_http_client_connect_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl HttpClientConfig {
    pub fn build_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .user_agent(&self.user_agent)
            .build()
    }
}

// Two small JSON documents; anything slower than this is an outage.
fn default_http_client_timeout() -> u64 {
    30
}

fn default_http_client_connect_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("openrouter-usage/{}", env!("CARGO_PKG_VERSION"))
}
