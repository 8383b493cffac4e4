//! The remote client boundary.
//!
//! The export engine only ever reads: one collection per entity kind.
//! Pagination, authentication and response-shape quirks belong to the
//! implementations of [`PolicyClient`], not to the engine.

use async_trait::async_trait;
use policy_schema::EntityKind;
use serde_json::Value;
use thiserror::Error;

use crate::config::ConfigError;

/// Policy service client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The service could not be reached at all.
    #[error("Service unreachable: {0}")]
    Unreachable(String),

    /// API returned an error response.
    #[error("API error ({status}): {message}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// Authentication failed.
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// Invalid response from the API.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// The request did not complete before the deadline.
    #[error("Request timed out")]
    TimedOut,

    /// The client is missing configuration required to make requests.
    #[error("Client not configured: {0}")]
    NotConfigured(#[from] ConfigError),
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// Whether retrying the same request may succeed.
    ///
    /// Network failures, timeouts, rate limiting and server errors are
    /// transient. Authentication, configuration and response-shape errors
    /// are not.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::RequestFailed(e) => {
                e.is_timeout() || e.is_connect() || e.is_request() || e.is_body()
            }
            ClientError::Unreachable(_) | ClientError::TimedOut => true,
            ClientError::ApiError { status, .. } => *status == 429 || *status >= 500,
            ClientError::AuthenticationFailed
            | ClientError::InvalidResponse(_)
            | ClientError::NotConfigured(_) => false,
        }
    }

    /// Whether the error means no connection to the service could be made.
    pub fn is_connection_failure(&self) -> bool {
        match self {
            ClientError::Unreachable(_) => true,
            ClientError::RequestFailed(e) => e.is_connect(),
            _ => false,
        }
    }
}

/// Read access to the policy service, one collection per entity kind.
#[async_trait]
pub trait PolicyClient: Send + Sync {
    /// Check that the client can attempt requests at all.
    ///
    /// Called once before any fetch; an error here aborts the whole export.
    async fn ensure_ready(&self) -> ClientResult<()> {
        Ok(())
    }

    /// List every entity of `kind`, in the service's listing order.
    async fn list(&self, kind: EntityKind) -> ClientResult<Vec<Value>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_errors_transient_by_status() {
        let rate_limited = ClientError::ApiError {
            status: 429,
            message: "slow down".to_string(),
        };
        let unavailable = ClientError::ApiError {
            status: 503,
            message: "maintenance".to_string(),
        };
        let not_found = ClientError::ApiError {
            status: 404,
            message: "no such project".to_string(),
        };
        assert!(rate_limited.is_transient());
        assert!(unavailable.is_transient());
        assert!(!not_found.is_transient());
    }

    #[test]
    fn test_permanent_errors() {
        assert!(!ClientError::AuthenticationFailed.is_transient());
        assert!(!ClientError::InvalidResponse("bad".to_string()).is_transient());
        assert!(ClientError::TimedOut.is_transient());
    }

    #[test]
    fn test_connection_failure() {
        assert!(ClientError::Unreachable("refused".to_string()).is_connection_failure());
        assert!(!ClientError::TimedOut.is_connection_failure());
        assert!(!ClientError::AuthenticationFailed.is_connection_failure());
    }

    #[test]
    fn test_error_messages() {
        let err = ClientError::ApiError {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "API error (500): boom");
        assert_eq!(
            ClientError::NotConfigured(ConfigError::MissingEnvVar("PERMIT_API_KEY".to_string()))
                .to_string(),
            "Client not configured: Missing required environment variable: PERMIT_API_KEY"
        );
    }
}
