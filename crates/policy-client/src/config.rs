//! Service configuration for the policy service client.
//!
//! Provides the endpoint, credentials, project/environment scope and timeout
//! settings used to read policy configuration. Configuration is loaded from
//! environment variables with defaults pointing at the hosted API.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::retry::RetryConfig;

/// Why a [`ServiceConfig`] cannot be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable that has no usable default is unset.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// A setting is present but unusable.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl ConfigError {
    fn invalid(key: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// Where the policy service lives and which project/environment to read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub endpoint: ServiceEndpoint,

    /// Project key or id the export is scoped to
    pub project: String,

    /// Environment key or id the export is scoped to
    pub environment: String,

    /// Per-request timeout, in seconds
    pub default_timeout_secs: u64,

    /// Retries after the first attempt for transient failures
    pub max_retries: u32,

    /// Items requested per page
    pub page_size: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: ServiceEndpoint {
                base_url: "https://api.permit.io".to_string(),
                api_key: None,
            },
            project: "default".to_string(),
            environment: "production".to_string(),
            default_timeout_secs: 30,
            max_retries: 3,
            page_size: 100,
        }
    }
}

/// Parse `name` from the environment, `None` when unset or unparsable.
fn env_parsed<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok()?.trim().parse().ok()
}

impl ServiceConfig {
    /// Read the configuration from `PERMIT_*` environment variables.
    ///
    /// | Variable              | Default                  |
    /// |-----------------------|--------------------------|
    /// | `PERMIT_API_URL`      | `https://api.permit.io`  |
    /// | `PERMIT_API_KEY`      | none                     |
    /// | `PERMIT_PROJECT`      | `default`                |
    /// | `PERMIT_ENV`          | `production`             |
    /// | `PERMIT_TIMEOUT_SECS` | `30`                     |
    /// | `PERMIT_MAX_RETRIES`  | `3`                      |
    /// | `PERMIT_PAGE_SIZE`    | `100`                    |
    ///
    /// Unparsable numbers fall back to their default. Nothing is validated
    /// here; call [`ServiceConfig::validate`] before use.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("PERMIT_API_URL") {
            config.endpoint.base_url = url;
        }
        config.endpoint.api_key = std::env::var("PERMIT_API_KEY").ok();
        if let Ok(project) = std::env::var("PERMIT_PROJECT") {
            config.project = project;
        }
        if let Ok(environment) = std::env::var("PERMIT_ENV") {
            config.environment = environment;
        }
        if let Some(secs) = env_parsed("PERMIT_TIMEOUT_SECS") {
            config.default_timeout_secs = secs;
        }
        if let Some(retries) = env_parsed("PERMIT_MAX_RETRIES") {
            config.max_retries = retries;
        }
        if let Some(size) = env_parsed::<u32>("PERMIT_PAGE_SIZE").filter(|size| *size > 0) {
            config.page_size = size;
        }
        config
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }

    /// Retry policy derived from `max_retries`.
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::from_max_retries(self.max_retries)
    }

    /// Check that everything needed to talk to the service is present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.endpoint.has_api_key() {
            return Err(ConfigError::MissingEnvVar("PERMIT_API_KEY".to_string()));
        }

        let url = reqwest::Url::parse(&self.endpoint.base_url)
            .map_err(|e| ConfigError::invalid("PERMIT_API_URL", e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::invalid(
                "PERMIT_API_URL",
                format!("unsupported scheme `{}`", url.scheme()),
            ));
        }

        for (key, value) in [("PERMIT_PROJECT", &self.project), ("PERMIT_ENV", &self.environment)] {
            if value.trim().is_empty() {
                return Err(ConfigError::invalid(key, "must not be empty"));
            }
        }
        Ok(())
    }
}

/// Base URL and credentials of the policy service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    pub base_url: String,

    /// Sent as `Authorization: Bearer <key>`
    pub api_key: Option<String>,
}

impl ServiceEndpoint {
    /// Join `path` onto the base URL with exactly one `/` between them.
    pub fn join(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Whether a non-empty API key is set.
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|key| !key.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> ServiceConfig {
        let mut config = ServiceConfig::default();
        config.endpoint.api_key = Some("permit_key_test".to_string());
        config
    }

    #[test]
    fn test_defaults_point_at_hosted_api() {
        let config = ServiceConfig::default();
        assert_eq!(config.endpoint.base_url, "https://api.permit.io");
        assert_eq!(config.default_timeout_secs, 30);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.page_size, 100);
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_retry_config_counts_first_attempt() {
        let config = ServiceConfig::default();
        assert_eq!(config.retry_config().max_attempts, 4);
    }

    #[test]
    fn test_endpoint_join_uses_single_slash() {
        let mut endpoint = ServiceEndpoint {
            base_url: "https://policy.example.com/".to_string(),
            api_key: None,
        };

        for path in ["/v2/schema/p/e/roles", "v2/schema/p/e/roles"] {
            assert_eq!(
                endpoint.join(path),
                "https://policy.example.com/v2/schema/p/e/roles"
            );
        }

        assert!(!endpoint.has_api_key());
        endpoint.api_key = Some(String::new());
        assert!(!endpoint.has_api_key());
        endpoint.api_key = Some("permit_key_test".to_string());
        assert!(endpoint.has_api_key());
    }

    #[test]
    fn test_validate_requires_api_key() {
        let config = ServiceConfig::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingEnvVar(var)) if var == "PERMIT_API_KEY"
        ));
        assert!(configured().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = configured();
        config.endpoint.base_url = "ftp://api.example.com".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key, .. }) if key == "PERMIT_API_URL"
        ));

        config.endpoint.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_blank_scope() {
        let mut config = configured();
        config.environment = " ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key, .. }) if key == "PERMIT_ENV"
        ));
    }
}
