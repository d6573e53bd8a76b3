use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::domain::errors::CatalogError;

/// Retry policy with exponential backoff for catalog requests
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts
    max_retries: u32,
    /// Initial backoff duration in milliseconds
    initial_backoff_ms: u64,
    /// Maximum backoff duration in milliseconds
    max_backoff_ms: u64,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        Self {
            max_retries,
            initial_backoff_ms,
            max_backoff_ms: max_backoff_ms.max(initial_backoff_ms),
        }
    }

    /// Execute an operation, retrying every transient error.
    pub async fn execute<F, Fut, T>(&self, operation: F) -> Result<T, CatalogError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CatalogError>>,
    {
        self.execute_when(operation, CatalogError::is_transient).await
    }

    /// Execute an operation, retrying only errors accepted by `retryable`.
    ///
    /// Requests that create remote state use this with a narrower predicate:
    /// a 5xx after the server applied the write would otherwise duplicate it.
    pub async fn execute_when<F, Fut, T, P>(&self, mut operation: F, retryable: P) -> Result<T, CatalogError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CatalogError>>,
        P: Fn(&CatalogError) -> bool,
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => {
                    if attempt > 0 {
                        debug!(retries = attempt, "Request succeeded after retrying");
                    }
                    return Ok(result);
                }
                Err(err) if attempt < self.max_retries && retryable(&err) => {
                    let backoff = self.calculate_backoff(attempt);
                    warn!(
                        attempt = attempt + 1,
                        backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "Transient catalog error, retrying"
                    );
                    sleep(backoff).await;
                    attempt += 1;
                }
                Err(err) => {
                    if attempt > 0 {
                        warn!(attempts = attempt + 1, error = %err, "Request failed after retries");
                    }
                    return Err(err);
                }
            }
        }
    }

    /// Formula: min(initial_backoff * 2^attempt, max_backoff)
    fn calculate_backoff(&self, attempt: u32) -> Duration {
        let backoff_ms = self
            .initial_backoff_ms
            .saturating_mul(2_u64.saturating_pow(attempt))
            .min(self.max_backoff_ms);

        Duration::from_millis(backoff_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, 1_000, 30_000)
    }
}
