//! Usage source trait and the bounded retry loop.

use async_trait::async_trait;
use relaymeter_core::UsageSnapshot;
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::retry::RetryStrategy;

/// A single-attempt source of usage data.
///
/// Each method performs exactly one round-trip; retrying is the caller's
/// job (see [`fetch_with_retry`]).
#[async_trait]
pub trait UsageSource: Send + Sync {
    /// Fetches `user-stats` for an API id.
    async fn fetch_user_stats(&self, api_url: &str, api_id: &str)
    -> Result<UsageSnapshot, FetchError>;

    /// Resolves an API key to its API id.
    async fn resolve_api_id(&self, api_url: &str, api_key: &str) -> Result<String, FetchError>;
}

/// Fetches usage with up to `strategy.max_attempts` attempts.
///
/// Sleeps `strategy.delay_for_attempt(n)` between attempts. Non-retryable
/// errors are returned immediately.
///
/// # Errors
///
/// Returns `FetchError::RetriesExhausted` wrapping the last error when every
/// attempt fails.
pub async fn fetch_with_retry(
    source: &dyn UsageSource,
    api_url: &str,
    api_id: &str,
    strategy: &RetryStrategy,
) -> Result<UsageSnapshot, FetchError> {
    let max_attempts = strategy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        debug!(url = %api_url, attempt, max_attempts, "Fetching user stats");

        let err = match source.fetch_user_stats(api_url, api_id).await {
            Ok(snapshot) => return Ok(snapshot),
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) => err,
        };

        warn!(error = %err, attempt, max_attempts, "Fetch attempt failed");

        if attempt >= max_attempts {
            return Err(FetchError::RetriesExhausted {
                attempts: attempt,
                last: Box::new(err),
            });
        }

        let delay = strategy.delay_for_attempt(attempt);
        debug!(delay_ms = delay.as_millis(), "Waiting before retry");
        tokio::time::sleep(delay).await;
    }
}
