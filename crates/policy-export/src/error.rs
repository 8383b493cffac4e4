//! Error types for export operations
//!
//! Only [`ExportError`] aborts a run. Record-level problems are reported as
//! [`ReferenceError`] or [`policy_schema::ValidationError`] and turned into
//! warnings by the generators.

use policy_client::ClientError;
use policy_schema::EntityKind;
use thiserror::Error;

/// Fatal export errors.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The client refused to start (missing credentials, bad configuration)
    #[error("Policy client is not ready: {0}")]
    NotReady(#[source] ClientError),

    /// No selected entity kind could be fetched because the service was unreachable
    #[error("Policy service unreachable, all {} fetches failed: {reason}", .failed.len())]
    ServiceUnreachable {
        /// Kinds whose fetch failed
        failed: Vec<EntityKind>,
        /// First connection error observed
        reason: String,
    },
}

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// A record references an entity that was never registered.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("dangling reference to {} `{key}`", .kind.singular_name())]
pub struct ReferenceError {
    /// Kind the reference was looked up in
    pub kind: EntityKind,
    /// Key that could not be found
    pub key: String,
}

impl ReferenceError {
    /// Create a reference error for `key` of `kind`.
    pub fn new(kind: EntityKind, key: impl Into<String>) -> Self {
        Self {
            kind,
            key: key.into(),
        }
    }
}
