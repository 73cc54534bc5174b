//! Bounded exponential-backoff retry around fallible upstream operations.
//!
//! Every attempt first passes through the process-wide [`RateLimiter`].
//! Only a fixed whitelist of transient statuses is retried; any other
//! failure — including transport errors with no status at all — is surfaced
//! immediately as `UpstreamRejected`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use lectern_core::{Error, UpstreamError};
use tracing::warn;

use crate::rate_limit::RateLimiter;

/// Whether an upstream status is worth retrying.
///
/// The whitelist: rate-limited, unauthorized, bad-request, bad-gateway,
/// service-unavailable, gateway-timeout. Everything else is permanent.
pub fn is_transient(status: u16) -> bool {
    matches!(status, 429 | 401 | 400 | 502 | 503 | 504)
}

/// Retry tuning knobs.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Re-attempts after the first failure.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(60_000),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }

    /// Backoff before re-attempting after failed attempt `i` (0-based):
    /// `min(base_delay * 2^i, max_delay)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Wraps fallible async operations with rate-limited, bounded retry.
///
/// Cheap to clone — clones share the rate limiter.
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    limiter: Arc<RateLimiter>,
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub fn new(limiter: Arc<RateLimiter>, policy: RetryPolicy) -> Self {
        Self { limiter, policy }
    }

    /// Run `operation`, retrying transient failures with exponential backoff.
    ///
    /// The rate limiter is consulted before every attempt, including the
    /// first. A non-transient failure rejects immediately; a transient
    /// failure that persists past `max_retries` re-attempts surfaces as
    /// `UpstreamExhausted` carrying the last observed cause.
    pub async fn execute<T, F, Fut>(&self, operation: F) -> Result<T, Error>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, UpstreamError>>,
    {
        let mut attempts = 0u32;
        loop {
            self.limiter.admit().await;
            attempts += 1;

            match operation().await {
                Ok(value) => return Ok(value),
                Err(cause) => {
                    let transient = cause.status_code().is_some_and(is_transient);
                    if !transient {
                        return Err(Error::UpstreamRejected(cause));
                    }
                    if attempts > self.policy.max_retries {
                        return Err(Error::UpstreamExhausted {
                            attempts: attempts as usize,
                            source: cause,
                        });
                    }

                    let delay = self.policy.delay_for(attempts - 1);
                    warn!(
                        attempt = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %cause,
                        "transient upstream failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
