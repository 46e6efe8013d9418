//! Bounded retry for rate-limited endpoints.
//!
//! The search service answers `429 Too Many Requests` when it is being polled
//! too quickly. The request is repeated unchanged after a fixed wait, up to a
//! ceiling, after which [`ResolveError::RateLimited`] is surfaced carrying the
//! number of attempts made.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::sources::ResolveError;

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,
    /// Fixed wait between attempts
    pub wait: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 10,
            wait: Duration::from_secs(1),
        }
    }
}

impl RetryConfig {
    pub fn new(max_retries: u32, wait: Duration) -> Self {
        Self { max_retries, wait }
    }

    /// Total attempts allowed, first one included
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Run `operation`, repeating it while it reports a rate limit.
///
/// Any other error is returned immediately. With `N` rate-limited answers
/// followed by a success, exactly `N + 1` attempts are made.
pub async fn with_rate_limit_retry<T, F, Fut>(
    config: RetryConfig,
    mut operation: F,
) -> Result<T, ResolveError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ResolveError>>,
{
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;

        match operation().await {
            Ok(value) => {
                if attempts > 1 {
                    tracing::info!(
                        "Request succeeded on attempt {} after {} rate-limited responses",
                        attempts,
                        attempts - 1
                    );
                }
                return Ok(value);
            }
            Err(ResolveError::RateLimited { url, .. }) => {
                if attempts >= config.max_attempts() {
                    tracing::warn!("Giving up on {} after {} rate-limited attempts", url, attempts);
                    return Err(ResolveError::RateLimited { url, attempts });
                }

                tracing::debug!(
                    "Rate limited on attempt {}/{}, retrying in {:?}",
                    attempts,
                    config.max_attempts(),
                    config.wait
                );
                sleep(config.wait).await;
            }
            Err(error) => return Err(error),
        }
    }
}
