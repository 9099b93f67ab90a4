//! Retry policy for outbound HTTP calls.
//!
//! Exponential backoff with bounded additive jitter.

use rand::Rng;
use reqwest::StatusCode;
use std::time::Duration;

/// Configuration for retry behavior.
#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not including the initial attempt).
    pub max_retries: u32,
    /// Initial backoff duration before first retry.
    pub initial_backoff: Duration,
    /// Maximum backoff duration, before jitter.
    pub max_backoff: Duration,
    /// Backoff multiplier for exponential backoff.
    pub backoff_multiplier: f64,
    /// Upper bound of the random delay added to each backoff.
    pub max_jitter: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::from_millis(2),
            max_backoff: Duration::from_millis(9),
            backoff_multiplier: 2.0,
            max_jitter: Duration::from_millis(2),
        }
    }
}

impl RetryConfig {
    /// Create a new retry config with the specified max retries.
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Backoff before retry number `attempt` (zero based), without jitter.
    pub fn base_backoff(&self, attempt: u32) -> Duration {
        let backoff =
            self.initial_backoff.as_millis() as f64 * self.backoff_multiplier.powi(attempt as i32);
        let backoff_ms = backoff.min(self.max_backoff.as_millis() as f64) as u64;
        Duration::from_millis(backoff_ms)
    }

    /// Backoff before retry number `attempt`, jitter included.
    pub fn backoff_duration(&self, attempt: u32) -> Duration {
        let jitter_ms = self.max_jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
        };

        self.base_backoff(attempt) + jitter
    }
}

/// Timeouts and connection failures are worth another attempt. Anything
/// else (bad URL, redirect loop, undecodable body) fails the same way again.
pub fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

/// Server-side failures worth another attempt. Client errors never are.
pub fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error()
}
