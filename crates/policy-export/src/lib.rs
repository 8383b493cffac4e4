//! # Policy Export
//!
//! Exports an authorization service's policy configuration as a Terraform
//! document for the `permitio` provider.
//!
//! ## Overview
//!
//! The policy-export crate handles:
//! - **Identifiers**: Sanitized, collision-free block names per entity kind
//! - **Warnings**: Everything that was skipped, without aborting the run
//! - **Generators**: One per entity kind, turning raw listings into HCL blocks
//! - **Orchestration**: Concurrent fetching, then rendering in dependency order
//! - **Provider preamble**: `terraform`, `variable` and `provider` blocks
//!
//! ## Partial exports
//!
//! A run keeps going when a kind cannot be fetched or a record cannot be
//! exported. Each such problem becomes one [`Warning`] and the rest of the
//! document is still produced; [`ExportOutcome::is_partial`] tells the two
//! apart. Only an unready client or a completely unreachable service fail
//! the run with an [`ExportError`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use policy_client::{HttpPolicyClient, ServiceConfig};
//! use policy_export::{run_export, ExportConfig};
//!
//! async fn export() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = ServiceConfig::from_env();
//!     let config = ExportConfig::from_service_config(&service);
//!     let client = HttpPolicyClient::new(service)?;
//!
//!     let outcome = run_export(&client, &config).await?;
//!     for warning in &outcome.warnings {
//!         eprintln!("warning: {}", warning);
//!     }
//!     std::fs::write("permit.tf", &outcome.document)?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod generators;
pub mod hcl;
pub mod identifiers;
pub mod orchestrator;
pub mod provider;
pub mod warnings;

pub use config::ExportConfig;
pub use context::ExportContext;
pub use error::{ExportError, ExportResult, ReferenceError};
pub use generators::{generator_for, ActionCatalog, EntityGenerator, Generator};
pub use identifiers::{sanitize, Identifier, IdentifierResolver};
pub use orchestrator::{run_export, ExportOutcome};
pub use warnings::{Warning, WarningCollector};
