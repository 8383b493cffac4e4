//! # Policy Client
//!
//! Read access to the authorization service's policy configuration.
//!
//! ## Overview
//!
//! The policy-client crate handles:
//! - **Boundary**: The [`PolicyClient`] trait, one listing per entity kind
//! - **HTTP**: [`HttpPolicyClient`], bearer-token authenticated and paginated
//! - **Configuration**: [`ServiceConfig`] loaded from environment variables
//! - **Retries**: Exponential backoff for transient failures
//! - **Testing**: [`InMemoryClient`] with scripted failures and delays
//!
//! ## Endpoints
//!
//! | Kind | Endpoint |
//! |------|----------|
//! | resources, actions | `GET /v2/schema/{project}/{env}/resources` |
//! | user attributes | `GET /v2/schema/{project}/{env}/resources/__user/attributes` |
//! | roles | `GET /v2/schema/{project}/{env}/roles` |
//! | resource sets | `GET /v2/schema/{project}/{env}/condition_sets?type=resourceset` |
//! | user sets | `GET /v2/schema/{project}/{env}/condition_sets?type=userset` |
//! | relations | `GET /v2/schema/{project}/{env}/relations` |
//! | condition set rules | `GET /v2/facts/{project}/{env}/set_rules` |
//!
//! Actions are not listed on their own by the service; they are read from
//! the resources listing and flattened, each gaining a `resource` field.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use policy_client::{HttpPolicyClient, PolicyClient, ServiceConfig};
//! use policy_schema::EntityKind;
//!
//! async fn roles() -> Result<(), policy_client::ClientError> {
//!     let client = HttpPolicyClient::new(ServiceConfig::from_env())?;
//!     client.ensure_ready().await?;
//!
//!     let roles = client.list(EntityKind::Role).await?;
//!     println!("{} roles", roles.len());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod http;
pub mod memory;
pub mod retry;

pub use client::{ClientError, ClientResult, PolicyClient};
pub use config::{ConfigError, ServiceConfig, ServiceEndpoint};
pub use http::HttpPolicyClient;
pub use memory::{InMemoryClient, ScriptedFailure};
pub use retry::{with_retry_if, Backoff, RetryConfig};
