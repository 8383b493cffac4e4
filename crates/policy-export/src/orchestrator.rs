//! # Export Orchestrator
//!
//! Runs one export in two phases:
//!
//! 1. **Fetch**: every selected kind is listed concurrently (bounded by
//!    `max_concurrency`), with transient failures retried and the whole
//!    phase bounded by an optional deadline.
//! 2. **Render**: generators run one at a time in dependency order, sharing
//!    one [`ExportContext`], so every reference a kind needs was registered by
//!    an earlier kind. The action listing is staged first, since actions are
//!    rendered inside their resource's block.
//!
//! A kind whose fetch failed contributes one warning and no blocks. The run
//! only fails as a whole when the client is not ready, or when every fetch
//! failed because the service could not be reached.

use futures::stream::{self, StreamExt};
use policy_client::{with_retry_if, ClientError, ClientResult, PolicyClient};
use policy_schema::EntityKind;
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, info, instrument};

use crate::config::ExportConfig;
use crate::context::ExportContext;
use crate::error::{ExportError, ExportResult};
use crate::generators::{fetch_failure_message, generator_for};
use crate::identifiers::IdentifierResolver;
use crate::provider::preamble;
use crate::warnings::Warning;

/// Result of a completed export run.
#[derive(Debug, Clone)]
pub struct ExportOutcome {
    /// The rendered Terraform document
    pub document: String,
    /// Everything that was skipped, in the order it happened
    pub warnings: Vec<Warning>,
    /// Identifiers allocated during the run
    pub identifiers: IdentifierResolver,
}

impl ExportOutcome {
    /// Whether anything was skipped.
    pub fn is_partial(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(|w| w.message.clone()).collect()
    }
}

type Fetched = (EntityKind, ClientResult<Vec<Value>>);

/// Export the policy configuration behind `client` as a Terraform document.
///
/// # Errors
///
/// * [`ExportError::NotReady`] if the client refuses to start
/// * [`ExportError::ServiceUnreachable`] if every selected fetch failed to connect
#[instrument(skip(client, config), fields(kinds = config.kinds.len()))]
pub async fn run_export<C>(client: &C, config: &ExportConfig) -> ExportResult<ExportOutcome>
where
    C: PolicyClient + ?Sized,
{
    client.ensure_ready().await.map_err(ExportError::NotReady)?;

    let kinds = config.selected_kinds();
    let fetched = fetch_all(client, &kinds, config).await;
    check_reachable(&fetched)?;

    let mut ctx = match fetched.iter().find(|(kind, _)| *kind == EntityKind::Action) {
        Some((_, Ok(actions))) => ExportContext::with_actions(actions),
        _ => ExportContext::new(),
    };
    let mut sections = Vec::with_capacity(fetched.len() + 1);
    if config.include_provider {
        sections.push(preamble(config));
    }

    for (kind, result) in fetched {
        let section = match result {
            Ok(raw) => generator_for(kind).run(&raw, &mut ctx),
            Err(e) => {
                ctx.warnings.add(kind, fetch_failure_message(kind, &e));
                String::new()
            }
        };
        if !section.is_empty() {
            sections.push(section);
        }
    }

    let outcome = ExportOutcome {
        document: sections.join("\n"),
        warnings: ctx.warnings.into_warnings(),
        identifiers: ctx.identifiers,
    };
    info!(
        blocks = outcome.identifiers.len(),
        warnings = outcome.warning_count(),
        "Export finished"
    );
    Ok(outcome)
}

/// List every kind, keeping the order of `kinds` in the result.
async fn fetch_all<C>(client: &C, kinds: &[EntityKind], config: &ExportConfig) -> Vec<Fetched>
where
    C: PolicyClient + ?Sized,
{
    let deadline = config.timeout.map(|timeout| Instant::now() + timeout);

    stream::iter(kinds.iter().copied())
        .map(|kind| fetch_one(client, kind, config, deadline))
        .buffered(config.max_concurrency.max(1))
        .collect()
        .await
}

async fn fetch_one<C>(
    client: &C,
    kind: EntityKind,
    config: &ExportConfig,
    deadline: Option<Instant>,
) -> Fetched
where
    C: PolicyClient + ?Sized,
{
    let fetch = with_retry_if(
        &config.retry,
        kind.as_str(),
        || client.list(kind),
        ClientError::is_transient,
    );

    let result = match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, fetch)
            .await
            .unwrap_or_else(|_| Err(ClientError::TimedOut)),
        None => fetch.await,
    };

    match &result {
        Ok(raw) => debug!(kind = kind.as_str(), count = raw.len(), "Fetched listing"),
        Err(e) => debug!(kind = kind.as_str(), error = %e, "Listing failed"),
    }
    (kind, result)
}

/// Fail the run when every fetch failed to connect.
fn check_reachable(fetched: &[Fetched]) -> ExportResult<()> {
    if fetched.is_empty() {
        return Ok(());
    }

    let mut failed = Vec::with_capacity(fetched.len());
    let mut reason = None;
    for (kind, result) in fetched {
        match result {
            Err(e) if e.is_connection_failure() => {
                failed.push(*kind);
                reason.get_or_insert_with(|| e.to_string());
            }
            _ => return Ok(()),
        }
    }

    Err(ExportError::ServiceUnreachable {
        failed,
        reason: reason.unwrap_or_default(),
    })
}
