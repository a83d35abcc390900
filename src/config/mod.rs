//! Configuration for the usage dashboard backend.
//!
//! The service is configured via a TOML file, with support for environment
//! variable interpolation using `${VAR_NAME}` syntax. Every section is
//! optional; an empty file yields a working configuration that reads the
//! credential from `OPENROUTER_API_KEY`.
//!
//! # Example
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 3000
//!
//! [upstream]
//! base_url = "https://openrouter.ai/api/v1"
//! api_key_env = "OPENROUTER_API_KEY"
//! ```

mod dashboard;
mod observability;
mod server;
mod upstream;

use std::{path::Path, sync::LazyLock};

pub use dashboard::*;
pub use observability::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
pub use server::*;
pub use upstream::*;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Billing API connection settings.
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Presentation settings for the dashboard payload.
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Observability configuration (logging).
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// Environment variables in the format `${VAR_NAME}` are expanded.
    /// Missing variables cause an error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e, path.as_ref().to_path_buf()))?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(contents: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(contents)?;
        let config: AppConfig = toml::from_str(&expanded)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration for consistency and completeness.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.upstream.validate()?;
        self.dashboard.validate()?;

        if self.server.http_client.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "server.http_client.timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {1}: {0}")]
    Io(std::io::Error, std::path::PathBuf),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

static ENV_VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is a valid regex"));

/// Expand `${VAR}` references, skipping anything after a `#` comment marker.
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut result = String::with_capacity(input.len());

    for line in input.lines() {
        let comment_pos = line.find('#');
        let mut last_end = 0;

        for cap in ENV_VAR_PATTERN.captures_iter(line) {
            let Some(whole) = cap.get(0) else { continue };

            if let Some(pos) = comment_pos
                && whole.start() >= pos
            {
                continue;
            }

            result.push_str(&line[last_end..whole.start()]);

            let var_name = &cap[1];
            let value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;
            result.push_str(&value);

            last_end = whole.end();
        }

        result.push_str(&line[last_end..]);
        result.push('\n');
    }

    // Remove trailing newline if input didn't have one
    if !input.ends_with('\n') && result.ends_with('\n') {
        result.pop();
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::from_str("").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.upstream.base_url, "https://openrouter.ai/api/v1");
        assert_eq!(config.upstream.default_limit, 25.0);
        assert!(config.dashboard.utc_offset_minutes.is_none());
    }

    #[test]
    fn test_full_config() {
        let config = AppConfig::from_str(
            r#"
            [server]
            port = 8088

            [server.cors]
            allowed_origins = ["http://localhost:5173"]

            [upstream]
            base_url = "http://127.0.0.1:9999/api/v1"
            api_key = "sk-or-test"
            default_limit = 100.0

            [dashboard]
            utc_offset_minutes = 540

            [observability.logging]
            level = "debug"
        "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8088);
        assert_eq!(config.server.cors.allowed_origins.len(), 1);
        assert_eq!(config.upstream.api_key.as_deref(), Some("sk-or-test"));
        assert_eq!(config.upstream.default_limit, 100.0);
        assert_eq!(config.dashboard.utc_offset_minutes, Some(540));
        assert_eq!(config.observability.logging.level, LogLevel::Debug);
    }

    #[test]
    fn test_unknown_section_rejected() {
        let result = AppConfig::from_str("[database]\nurl = \"sqlite://x\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = AppConfig::from_str("[server.http_client]\ntimeout_secs = 0");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    #[serial]
    fn test_env_var_expansion() {
        temp_env::with_var("OPENROUTER_USAGE_TEST_PORT", Some("4321"), || {
            let config = AppConfig::from_str(
                "[server]\nport = ${OPENROUTER_USAGE_TEST_PORT} # ${NOT_EXPANDED}",
            )
            .unwrap();
            assert_eq!(config.server.port, 4321);
        });
    }

    #[test]
    #[serial]
    fn test_missing_env_var() {
        temp_env::with_var_unset("OPENROUTER_USAGE_TEST_MISSING", || {
            let result =
                AppConfig::from_str("[upstream]\napi_key = \"${OPENROUTER_USAGE_TEST_MISSING}\"");
            assert!(
                matches!(result, Err(ConfigError::EnvVarNotFound(ref name)) if name == "OPENROUTER_USAGE_TEST_MISSING")
            );
        });
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("usage.toml");
        std::fs::write(&path, "[server]\nport = 9090\n").unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.server.port, 9090);

        let missing = AppConfig::from_file(dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ConfigError::Io(..))));
    }
}
