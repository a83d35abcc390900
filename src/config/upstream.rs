use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Billing API (OpenRouter) connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamConfig {
    /// Base URL of the billing API. The credits and key-info paths are
    /// appended to it.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Explicit bearer credential. Takes precedence over `api_key_env`.
    /// Prefer the environment variable so the key stays out of config files.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Name of the environment variable holding the bearer credential.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Spending limit reported when neither upstream source supplies one.
    #[serde(default = "default_limit")]
    pub default_limit: f64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            api_key_env: default_api_key_env(),
            default_limit: default_limit(),
        }
    }
}

impl UpstreamConfig {
    /// Resolve the bearer credential.
    ///
    /// An explicit non-empty `api_key` wins; otherwise the non-empty value of
    /// the `api_key_env` variable. Blank values count as missing.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(key) = self.api_key.as_deref().map(str::trim)
            && !key.is_empty()
        {
            return Some(key.to_string());
        }

        std::env::var(&self.api_key_env)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        let url = url::Url::parse(&self.base_url).map_err(|e| {
            ConfigError::Validation(format!("upstream.base_url '{}': {}", self.base_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Validation(format!(
                "upstream.base_url must use http or https, got '{}'",
                url.scheme()
            )));
        }

        if !self.default_limit.is_finite() || self.default_limit < 0.0 {
            return Err(ConfigError::Validation(format!(
                "upstream.default_limit must be a non-negative number, got {}",
                self.default_limit
            )));
        }

        if self.api_key_env.trim().is_empty() {
            return Err(ConfigError::Validation(
                "upstream.api_key_env must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".to_string()
}

fn default_limit() -> f64 {
    25.00
}
