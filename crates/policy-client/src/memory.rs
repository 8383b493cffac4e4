//! In-memory policy client.
//!
//! Serves canned collections per entity kind and can be scripted to fail,
//! fail transiently, or respond slowly. Used to exercise the export engine
//! without a running service.
//!
//! # Example
//!
//! ```
//! use policy_client::memory::{InMemoryClient, ScriptedFailure};
//! use policy_client::PolicyClient;
//! use policy_schema::EntityKind;
//! use serde_json::json;
//!
//! # tokio_test_block_on(async {
//! let client = InMemoryClient::new()
//!     .with_entities(EntityKind::Role, vec![json!({ "key": "viewer", "name": "Viewer" })])
//!     .with_failure(EntityKind::Relation, ScriptedFailure::Api { status: 500, message: "boom".into() });
//!
//! assert_eq!(client.list(EntityKind::Role).await.unwrap().len(), 1);
//! assert!(client.list(EntityKind::Relation).await.is_err());
//! assert!(client.list(EntityKind::Resource).await.unwrap().is_empty());
//! assert_eq!(client.calls(EntityKind::Role), 1);
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```

use async_trait::async_trait;
use policy_schema::EntityKind;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::client::{ClientError, ClientResult, PolicyClient};
use crate::config::ConfigError;

/// A failure the in-memory client reproduces on request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedFailure {
    /// Error response with the given status.
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
    },
    /// No connection could be made.
    Unreachable(String),
    /// Credentials rejected.
    AuthenticationFailed,
    /// Malformed response body.
    InvalidResponse(String),
}

impl ScriptedFailure {
    fn to_error(&self) -> ClientError {
        match self {
            ScriptedFailure::Api { status, message } => ClientError::ApiError {
                status: *status,
                message: message.clone(),
            },
            ScriptedFailure::Unreachable(reason) => ClientError::Unreachable(reason.clone()),
            ScriptedFailure::AuthenticationFailed => ClientError::AuthenticationFailed,
            ScriptedFailure::InvalidResponse(reason) => {
                ClientError::InvalidResponse(reason.clone())
            }
        }
    }
}

#[derive(Debug, Clone)]
struct FailurePlan {
    failure: ScriptedFailure,
    /// `None` fails every call, `Some(n)` fails the first `n` calls.
    times: Option<u32>,
}

/// Policy client backed by in-memory collections.
#[derive(Debug, Default)]
pub struct InMemoryClient {
    collections: HashMap<EntityKind, Vec<Value>>,
    failures: HashMap<EntityKind, FailurePlan>,
    delays: HashMap<EntityKind, Duration>,
    not_ready: Option<String>,
    calls: Mutex<HashMap<EntityKind, u32>>,
}

impl InMemoryClient {
    /// Create a client that returns empty collections for every kind.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `entities` for `kind`.
    pub fn with_entities(mut self, kind: EntityKind, entities: Vec<Value>) -> Self {
        self.collections.insert(kind, entities);
        self
    }

    /// Fail every listing of `kind`.
    pub fn with_failure(mut self, kind: EntityKind, failure: ScriptedFailure) -> Self {
        self.failures.insert(
            kind,
            FailurePlan {
                failure,
                times: None,
            },
        );
        self
    }

    /// Fail the first `times` listings of `kind`, then serve its entities.
    pub fn with_transient_failures(
        mut self,
        kind: EntityKind,
        times: u32,
        failure: ScriptedFailure,
    ) -> Self {
        self.failures.insert(
            kind,
            FailurePlan {
                failure,
                times: Some(times),
            },
        );
        self
    }

    /// Delay every listing of `kind`.
    pub fn with_delay(mut self, kind: EntityKind, delay: Duration) -> Self {
        self.delays.insert(kind, delay);
        self
    }

    /// Make [`PolicyClient::ensure_ready`] fail with `reason`.
    pub fn not_ready(mut self, reason: impl Into<String>) -> Self {
        self.not_ready = Some(reason.into());
        self
    }

    /// Number of times `kind` has been listed.
    pub fn calls(&self, kind: EntityKind) -> u32 {
        self.calls
            .lock()
            .map(|calls| calls.get(&kind).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    fn record_call(&self, kind: EntityKind) -> u32 {
        match self.calls.lock() {
            Ok(mut calls) => {
                let count = calls.entry(kind).or_insert(0);
                *count += 1;
                *count
            }
            Err(_) => 0,
        }
    }
}

#[async_trait]
impl PolicyClient for InMemoryClient {
    async fn ensure_ready(&self) -> ClientResult<()> {
        match &self.not_ready {
            Some(reason) => Err(ClientError::NotConfigured(ConfigError::InvalidValue {
                key: "client".to_string(),
                message: reason.clone(),
            })),
            None => Ok(()),
        }
    }

    async fn list(&self, kind: EntityKind) -> ClientResult<Vec<Value>> {
        let call = self.record_call(kind);

        if let Some(delay) = self.delays.get(&kind) {
            tokio::time::sleep(*delay).await;
        }

        if let Some(plan) = self.failures.get(&kind) {
            if plan.times.map_or(true, |times| call <= times) {
                return Err(plan.failure.to_error());
            }
        }

        Ok(self.collections.get(&kind).cloned().unwrap_or_default())
    }
}
