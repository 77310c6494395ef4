use std::future::Future;
use std::time::Duration;
use uuid::Uuid;

use crate::errors::ProcessError;

/// Largest attempt budget whose backoff still shrinks on every retry.
pub const MAX_ATTEMPTS_LIMIT: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_unit: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_unit: Duration) -> Self {
        Self {
            max_attempts: max_attempts.clamp(1, MAX_ATTEMPTS_LIMIT),
            backoff_unit,
        }
    }

    /// Wait before the next attempt: `unit * 2^remaining`. Shrinks as attempts are used up.
    pub fn backoff(&self, attempts_remaining: u32) -> Duration {
        let factor = 1u32.checked_shl(attempts_remaining).unwrap_or(u32::MAX);
        self.backoff_unit.saturating_mul(factor)
    }
}

#[derive(Debug)]
pub struct RetryReport<T> {
    pub attempts: u32,
    pub waits: Vec<Duration>,
    pub outcome: Result<T, ProcessError>,
}

impl<T> RetryReport<T> {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Runs an order's attempts under a bounded retry policy.
#[derive(Debug, Clone, Default)]
pub struct RetryController {
    policy: RetryPolicy,
}

impl RetryController {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub async fn run<F, Fut, T>(&self, order_id: Uuid, mut attempt: F) -> RetryReport<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, ProcessError>>,
    {
        let max_attempts = self.policy.max_attempts;
        let mut waits = Vec::new();
        let mut attempts = 0;

        loop {
            attempts += 1;
            tracing::debug!(%order_id, attempt = attempts, max_attempts, "attempting order");

            let error = match attempt(attempts).await {
                Ok(value) => {
                    tracing::info!(%order_id, attempt = attempts, "successfully processed order");
                    return RetryReport {
                        attempts,
                        waits,
                        outcome: Ok(value),
                    };
                }
                Err(e) => e,
            };

            if !error.is_retryable() {
                tracing::warn!(%order_id, error = %error, "permanent failure, not retrying");
                return RetryReport {
                    attempts,
                    waits,
                    outcome: Err(error),
                };
            }

            let remaining = max_attempts.saturating_sub(attempts);
            if remaining == 0 {
                tracing::error!(%order_id, attempts, error = %error, "max retries reached");
                return RetryReport {
                    attempts,
                    waits,
                    outcome: Err(error),
                };
            }

            let delay = self.policy.backoff(remaining);
            tracing::info!(
                %order_id,
                attempt = attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "retrying order"
            );
            tokio::time::sleep(delay).await;
            waits.push(delay);
        }
    }
}
