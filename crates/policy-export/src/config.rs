//! Export configuration.

use policy_client::{RetryConfig, ServiceConfig};
use policy_schema::EntityKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// Default Terraform registry source of the permitio provider.
pub const DEFAULT_PROVIDER_SOURCE: &str = "registry.terraform.io/permitio/permit-io";

/// Default provider version constraint.
pub const DEFAULT_PROVIDER_VERSION: &str = "~> 0.0.14";

/// Default API URL written into the provider block.
pub const DEFAULT_API_URL: &str = "https://api.permit.io";

/// Options for one export run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Kinds to export. Kinds left out are neither fetched nor rendered.
    pub kinds: BTreeSet<EntityKind>,

    /// Maximum number of listings fetched at once
    pub max_concurrency: usize,

    /// Deadline for the whole fetch phase
    pub timeout: Option<Duration>,

    /// Retry policy for transient fetch failures
    pub retry: RetryConfig,

    /// Whether the document starts with the provider preamble
    pub include_provider: bool,

    pub provider_source: String,
    pub provider_version: String,
    pub api_url: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            kinds: EntityKind::DEPENDENCY_ORDER.into_iter().collect(),
            max_concurrency: 4,
            timeout: None,
            retry: RetryConfig::default(),
            include_provider: true,
            provider_source: DEFAULT_PROVIDER_SOURCE.to_string(),
            provider_version: DEFAULT_PROVIDER_VERSION.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

impl ExportConfig {
    /// Derive an export configuration from the client's service configuration.
    ///
    /// Takes the API URL, the fetch timeout and the retry count from it.
    pub fn from_service_config(service: &ServiceConfig) -> Self {
        Self {
            timeout: Some(service.timeout()),
            retry: service.retry_config(),
            api_url: service.endpoint.base_url.clone(),
            ..Self::default()
        }
    }

    /// Export only `kinds`.
    pub fn with_kinds(mut self, kinds: impl IntoIterator<Item = EntityKind>) -> Self {
        self.kinds = kinds.into_iter().collect();
        self
    }

    /// Export only the kinds named in `names` (snake_case, plurals accepted).
    ///
    /// Returns the first name that is not a known kind as the error.
    pub fn with_kind_names<I, S>(self, names: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let kinds = names
            .into_iter()
            .map(|name| EntityKind::parse(name.as_ref()).ok_or_else(|| name.as_ref().to_string()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.with_kinds(kinds))
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Omit the provider preamble.
    pub fn without_provider(mut self) -> Self {
        self.include_provider = false;
        self
    }

    pub fn with_provider_version(mut self, version: impl Into<String>) -> Self {
        self.provider_version = version.into();
        self
    }

    pub fn with_provider_source(mut self, source: impl Into<String>) -> Self {
        self.provider_source = source.into();
        self
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Selected kinds in dependency order.
    pub fn selected_kinds(&self) -> Vec<EntityKind> {
        EntityKind::DEPENDENCY_ORDER
            .into_iter()
            .filter(|kind| self.kinds.contains(kind))
            .collect()
    }
}
