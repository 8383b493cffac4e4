//! Retrying listings that fail transiently.
//!
//! The policy service occasionally answers with 5xx, rate limits, or drops
//! connections. [`with_retry_if`] repeats an operation while a predicate
//! says the error is worth retrying, sleeping on an exponential [`Backoff`]
//! schedule in between. Errors the predicate rejects are returned at once.
//!
//! # Example
//!
//! ```rust,no_run
//! use policy_client::retry::{with_retry_if, RetryConfig};
//! use policy_client::{ClientError, HttpPolicyClient, PolicyClient};
//! use policy_schema::EntityKind;
//!
//! async fn roles(client: &HttpPolicyClient) -> Result<usize, ClientError> {
//!     let roles = with_retry_if(
//!         &RetryConfig::from_max_retries(2),
//!         "roles",
//!         || client.list(EntityKind::Role),
//!         ClientError::is_transient,
//!     )
//!     .await?;
//!     Ok(roles.len())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How often and how patiently to retry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Attempts in total, the first one included. Zero behaves like one.
    pub max_attempts: u32,

    /// Pause before the second attempt
    pub initial_delay: Duration,

    /// Upper bound for any single pause
    pub max_delay: Duration,

    /// Factor the pause grows by after each failed attempt
    pub exponential_base: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::from_max_retries(2)
    }
}

impl RetryConfig {
    /// Allow `max_retries` retries after the first attempt, 100ms apart at first.
    pub fn from_max_retries(max_retries: u32) -> Self {
        Self {
            max_attempts: max_retries.saturating_add(1),
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            exponential_base: 2.0,
        }
    }

    /// Three attempts with millisecond pauses, for tests and local services.
    pub fn fast() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(50),
            exponential_base: 2.0,
        }
    }

    /// A single attempt.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::fast()
        }
    }

    /// Pause schedule for this configuration.
    pub fn backoff(&self) -> Backoff {
        Backoff {
            next: self.initial_delay,
            max: self.max_delay,
            base: self.exponential_base.max(1.0),
        }
    }
}

/// Endless sequence of pauses, growing geometrically up to a cap.
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
    max: Duration,
    base: f64,
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let current = self.next.min(self.max);
        self.next = Duration::try_from_secs_f64(current.as_secs_f64() * self.base)
            .map_or(self.max, |grown| grown.min(self.max));
        Some(current)
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// runs out of attempts.
///
/// `what` names the operation in log events.
pub async fn with_retry_if<F, Fut, T, E, P>(
    config: &RetryConfig,
    what: &str,
    mut operation: F,
    mut is_retryable: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: FnMut(&E) -> bool,
{
    let max_attempts = config.max_attempts.max(1);
    let mut pauses = config.backoff();
    let mut attempt = 1;

    loop {
        let error = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    info!(operation = what, attempts = attempt, "Succeeded after retrying");
                }
                return Ok(value);
            }
            Err(error) => error,
        };

        if !is_retryable(&error) {
            debug!(operation = what, error = %error, "Not retryable");
            return Err(error);
        }
        if attempt >= max_attempts {
            warn!(operation = what, attempts = attempt, error = %error, "Giving up");
            return Err(error);
        }

        let pause = pauses.next().unwrap_or(config.max_delay);
        warn!(
            operation = what,
            attempt,
            max_attempts,
            pause_ms = pause.as_millis() as u64,
            error = %error,
            "Retrying"
        );
        tokio::time::sleep(pause).await;
        attempt += 1;
    }
}
