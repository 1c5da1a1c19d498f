//! Bounded retry with exponential backoff and jitter.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::clients::CallError;

/// Retry policy for the payment hop.
///
/// Only transient failures (see [`CallError::is_transient`]) are retried.
/// Before retry `i` (1-based) the caller waits `base_delay * 2^(i-1)` plus a
/// jitter drawn uniformly from `[jitter_min, jitter_max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub jitter_min: Duration,
    pub jitter_max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(100),
            jitter_min: Duration::from_millis(25),
            jitter_max: Duration::from_millis(75),
        }
    }
}

impl RetryPolicy {
    /// Total attempts allowed, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// The deterministic part of the wait before retry `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(retry.saturating_sub(1))
    }

    /// The full wait before retry `retry`, jitter included.
    pub fn delay_before(&self, retry: u32) -> Duration {
        self.backoff(retry) + self.jitter()
    }

    fn jitter(&self) -> Duration {
        if self.jitter_max <= self.jitter_min {
            return self.jitter_min;
        }
        let micros = rand::thread_rng()
            .gen_range(self.jitter_min.as_micros() as u64..self.jitter_max.as_micros() as u64);
        Duration::from_micros(micros)
    }

    /// Drives `call` until it succeeds, fails permanently, or attempts run out.
    ///
    /// `call` receives the 1-based attempt number. On exhaustion the last
    /// transient error is returned. No wait follows the final attempt.
    pub async fn run<T, F, Fut>(&self, mut call: F) -> Result<T, CallError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, CallError>>,
    {
        let mut attempt = 1;
        loop {
            match call(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.max_attempts() => {
                    let delay = self.delay_before(attempt);
                    tracing::warn!(
                        attempt,
                        error = %err,
                        delay_ms = delay.as_millis() as u64,
                        "transient failure, retrying"
                    );
                    metrics::counter!("gateway_charge_retries_total").increment(1);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    if err.is_transient() {
                        tracing::warn!(attempt, error = %err, "retries exhausted");
                    }
                    return Err(err);
                }
            }
        }
    }
}
