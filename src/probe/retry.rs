//! Bounded retry for probe attempts.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::result::{ProbeAttemptResult, RetrySeries};

/// Delay growth between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Backoff {
    /// Same delay every time.
    #[default]
    Fixed,
    /// `delay * multiplier^n`, capped at `max_delay_ms`.
    Exponential { multiplier: f64, max_delay_ms: u64 },
}

/// Retry policy for one probe request.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; a series runs at most
    /// `max_retries + 1` attempts.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub delay: Duration,
    pub backoff: Backoff,
    /// End the series on a feature-absence failure instead of retrying.
    pub stop_on_unsupported: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            delay: Duration::from_millis(1000),
            backoff: Backoff::Fixed,
            stop_on_unsupported: true,
        }
    }
}

impl RetryPolicy {
    /// Delay after the failed attempt with zero-based index `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential {
                multiplier,
                max_delay_ms,
            } => {
                let scaled_ms =
                    self.delay.as_millis() as f64 * multiplier.max(1.0).powi(attempt as i32);
                if scaled_ms >= max_delay_ms as f64 {
                    Duration::from_millis(max_delay_ms)
                } else {
                    Duration::from_millis(scaled_ms.round() as u64)
                }
            }
        }
    }

    /// Run `make_request` until it succeeds or the budget is spent.
    ///
    /// Every attempt's result is kept. Cancellation ends the series
    /// between attempts.
    pub async fn run<F, Fut>(&self, cancel: &CancellationToken, mut make_request: F) -> RetrySeries
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ProbeAttemptResult>,
    {
        let mut results = Vec::with_capacity(self.max_retries as usize + 1);

        for attempt in 0..=self.max_retries {
            if cancel.is_cancelled() {
                break;
            }

            let result = make_request().await;
            let success = result.success;
            let definitive = self.stop_on_unsupported && result.is_feature_unsupported();
            let message = result.error_message.clone();
            results.push(result);

            if success {
                return RetrySeries {
                    final_success: true,
                    results,
                };
            }
            if definitive || attempt == self.max_retries {
                break;
            }

            let delay = self.delay_for(attempt);
            tracing::warn!(
                attempt = attempt + 1,
                max_attempts = self.max_retries + 1,
                error = message.as_deref().unwrap_or("unknown"),
                delay_ms = delay.as_millis() as u64,
                "Retrying probe after failure"
            );

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        RetrySeries {
            final_success: false,
            results,
        }
    }
}

/// Call `make_request` up to `policy.max_retries + 1` times, waiting
/// between attempts and stopping at the first success.
pub async fn execute_probe_with_retry<F, Fut>(make_request: F, policy: &RetryPolicy) -> RetrySeries
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProbeAttemptResult>,
{
    policy.run(&CancellationToken::new(), make_request).await
}
