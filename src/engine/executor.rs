//! Resilient request executor.
//!
//! Every provider call goes through [`RequestExecutor::execute`], which
//! admits it through the shared [`RateLimiter`], classifies the outcome
//! and retries per [`RetryPolicy`]:
//!
//! - success / not-found: terminal, returned as an [`Outcome`]
//! - rate-limited: retried without bound after the provider's hint (or a
//!   fixed fallback), unless best-effort mode gives up immediately
//! - server or network failure: exponential backoff, bounded attempts
//! - anything else: terminal error, not retried
//!
//! A cancellation token interrupts limiter waits, in-flight calls and
//! backoff sleeps.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::limiter::RateLimiter;
use super::progress::ProgressTracker;
use crate::provider::ProviderError;

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts allowed for server/network failures before giving up.
    pub max_attempts: u32,
    /// Give up on the first rate-limit response instead of waiting.
    pub best_effort: bool,
    /// Wait used when a rate-limit response carries no hint.
    pub rate_limit_fallback: Duration,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            best_effort: false,
            rate_limit_fallback: Duration::from_secs(2),
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Non-error result of one logical call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Found(T),
    /// The provider has no such record.
    NotFound,
    /// Rate-limited in best-effort mode; treated as empty.
    Skipped,
}

impl<T> Outcome<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Outcome::Found(v) => Some(v),
            Outcome::NotFound | Outcome::Skipped => None,
        }
    }
}

impl<T: Default> Outcome<T> {
    /// The value, or an empty one when absent.
    pub fn unwrap_or_empty(self) -> T {
        self.found().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("gave up after {attempts} attempts (last status: {last_status:?})")]
    ExhaustedRetries {
        /// `None` when the last failure was a transport error.
        last_status: Option<u16>,
        attempts: u32,
    },

    #[error("request rejected with status {status}")]
    Rejected { status: u16 },

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("request cancelled")]
    Cancelled,
}

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

/// Rate-limited, retrying call runner shared by one analysis run.
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    limiter: Arc<RateLimiter>,
    tracker: Arc<ProgressTracker>,
    policy: RetryPolicy,
    cancel: CancellationToken,
}

impl RequestExecutor {
    pub fn new(
        limiter: Arc<RateLimiter>,
        tracker: Arc<ProgressTracker>,
        policy: RetryPolicy,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            limiter,
            tracker,
            policy,
            cancel,
        }
    }

    pub fn tracker(&self) -> &Arc<ProgressTracker> {
        &self.tracker
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Run one logical call to completion under the retry policy.
    ///
    /// `call` is invoked once per attempt. `label` only appears in logs.
    pub async fn execute<T, F, Fut>(&self, label: &str, mut call: F) -> Result<Outcome<T>, RequestError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut failures = 0u32;
        let mut backoff = self.policy.initial_backoff;

        loop {
            if self.cancel.is_cancelled() {
                return Err(RequestError::Cancelled);
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(RequestError::Cancelled),
                _ = self.limiter.acquire() => {}
            }

            self.tracker.record_attempt();
            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(RequestError::Cancelled),
                r = call() => r,
            };

            match result {
                Ok(value) => {
                    self.tracker.record_completion();
                    return Ok(Outcome::Found(value));
                }
                Err(ProviderError::NotFound) => {
                    debug!(call = label, "Not found");
                    self.tracker.record_completion();
                    return Ok(Outcome::NotFound);
                }
                Err(ProviderError::RateLimited { retry_after }) => {
                    if self.policy.best_effort {
                        warn!(call = label, "Rate limited, skipping (best-effort)");
                        self.tracker.record_completion();
                        return Ok(Outcome::Skipped);
                    }
                    let wait = retry_after.unwrap_or(self.policy.rate_limit_fallback);
                    warn!(
                        call = label,
                        wait_ms = wait.as_millis() as u64,
                        hinted = retry_after.is_some(),
                        "Rate limited, retrying"
                    );
                    self.tracker.record_rate_limit_retry(wait);
                    self.sleep(wait).await?;
                }
                Err(e @ (ProviderError::Server { .. } | ProviderError::Network(_))) => {
                    failures += 1;
                    let last_status = match &e {
                        ProviderError::Server { status } => Some(*status),
                        _ => None,
                    };
                    if failures >= max_attempts {
                        warn!(call = label, attempts = failures, error = %e, "Retries exhausted");
                        return Err(RequestError::ExhaustedRetries {
                            last_status,
                            attempts: failures,
                        });
                    }
                    warn!(
                        call = label,
                        attempt = failures,
                        delay_ms = backoff.as_millis() as u64,
                        error = %e,
                        "Transient failure, backing off"
                    );
                    self.tracker.record_backoff(backoff);
                    self.sleep(backoff).await?;
                    backoff = backoff.saturating_mul(2).min(self.policy.max_backoff);
                }
                Err(ProviderError::Status { status }) => {
                    warn!(call = label, status, "Request rejected");
                    return Err(RequestError::Rejected { status });
                }
                Err(ProviderError::Decode(msg)) => {
                    warn!(call = label, error = %msg, "Malformed response");
                    return Err(RequestError::Decode(msg));
                }
            }
        }
    }

    async fn sleep(&self, wait: Duration) -> Result<(), RequestError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(RequestError::Cancelled),
            _ = tokio::time::sleep(wait) => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
