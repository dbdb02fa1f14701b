//! Error-aware retry with exponential backoff
//!
//! [`with_retry`] drives one operation through repeated attempts while the
//! failure is retryable and the budget lasts. [`RetryingRepository`] applies
//! it uniformly to every repository call.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{CoreError, CoreResult};
use crate::traits::CredentialRepository;
use crate::types::{
    CredentialPatch, CredentialRecord, CredentialStats, ListQuery, NewCredential,
    PaginatedResponse,
};

/// Retry budget and backoff bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. `1` disables retrying.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Sleep before attempt `attempt + 1`, after `attempt` failures:
    /// `base_delay * 2^(attempt-1)`, capped at `max_delay`.
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(31);
        self.base_delay
            .saturating_mul(1u32 << exp)
            .min(self.max_delay)
    }
}

/// Run `f` until it succeeds, fails with a non-retryable error, or the
/// attempt budget is spent.
///
/// Every attempt leaves one log entry carrying `operation` and `attempt`:
/// `warn` for a retryable failure, `debug` for a first-try success and
/// `info` for a success after failures.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, operation: &str, f: F) -> CoreResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = CoreResult<T>>,
{
    with_retry_if(policy, operation, CoreError::is_retryable, f).await
}

/// [`with_retry`] with the caller deciding which errors are worth another attempt.
pub async fn with_retry_if<T, F, Fut, P>(
    policy: &RetryPolicy,
    operation: &str,
    should_retry: P,
    mut f: F,
) -> CoreResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = CoreResult<T>>,
    P: Fn(&CoreError) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt: u32 = 1;

    loop {
        match f().await {
            Ok(value) => {
                if attempt > 1 {
                    log::info!(
                        operation = operation, attempt = attempt;
                        "{operation} succeeded on attempt {attempt} after {} failure(s)",
                        attempt - 1
                    );
                } else {
                    log::debug!(
                        operation = operation, attempt = attempt;
                        "{operation} succeeded on attempt {attempt}"
                    );
                }
                return Ok(value);
            }
            Err(err) if !should_retry(&err) => {
                if err.is_expected() {
                    log::debug!(
                        operation = operation, attempt = attempt, kind = err.kind().as_str();
                        "{operation} rejected on attempt {attempt}: {err}"
                    );
                } else {
                    log::error!(
                        operation = operation, attempt = attempt, kind = err.kind().as_str();
                        "{operation} failed on attempt {attempt} with non-retryable error: {err}"
                    );
                }
                return Err(err);
            }
            Err(err) => {
                log::warn!(
                    operation = operation, attempt = attempt, kind = err.kind().as_str();
                    "{operation} attempt {attempt}/{max_attempts} failed: {err}"
                );

                if attempt >= max_attempts {
                    log::error!(
                        operation = operation, attempt = attempt, kind = err.kind().as_str();
                        "{operation} gave up after {attempt} attempt(s): {err}"
                    );
                    return Err(err);
                }

                tokio::time::sleep(policy.backoff_delay(attempt)).await;
                attempt += 1;
            }
        }
    }
}

/// Inserts are not retried on `Unknown`: the row may already be committed.
fn create_is_retryable(err: &CoreError) -> bool {
    err.is_retryable() && !matches!(err, CoreError::Unknown(_))
}

/// Repository decorator that retries classified transient failures.
pub struct RetryingRepository {
    inner: Arc<dyn CredentialRepository>,
    policy: RetryPolicy,
}

impl RetryingRepository {
    #[must_use]
    pub fn new(inner: Arc<dyn CredentialRepository>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl CredentialRepository for RetryingRepository {
    async fn list(&self, query: &ListQuery) -> CoreResult<PaginatedResponse<CredentialRecord>> {
        with_retry(&self.policy, "list", || self.inner.list(query)).await
    }

    async fn get_by_id(&self, id: &str) -> CoreResult<CredentialRecord> {
        with_retry(&self.policy, "get_by_id", || self.inner.get_by_id(id)).await
    }

    async fn create(&self, data: &NewCredential) -> CoreResult<CredentialRecord> {
        with_retry_if(&self.policy, "create", create_is_retryable, || {
            self.inner.create(data)
        })
        .await
    }

    async fn update(&self, id: &str, patch: &CredentialPatch) -> CoreResult<CredentialRecord> {
        with_retry(&self.policy, "update", || self.inner.update(id, patch)).await
    }

    async fn delete(&self, id: &str) -> CoreResult<()> {
        with_retry(&self.policy, "delete", || self.inner.delete(id)).await
    }

    async fn stats(&self, window_days: u32) -> CoreResult<CredentialStats> {
        with_retry(&self.policy, "stats", || self.inner.stats(window_days)).await
    }
}
