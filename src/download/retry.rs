//! Opt-in retry logic for transfers
//!
//! The default configuration performs no retries at all; `--retries N` raises
//! the limit for transient network failures only.

use crate::error::FetchError;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,
    /// Initial delay between retries
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Backoff multiplier
    pub backoff_multiplier: f64,
    /// Jitter factor (0.0 to 1.0)
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

impl RetryConfig {
    /// Default backoff with the given retry limit
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }
}

/// Retry executor
pub struct RetryExecutor {
    config: RetryConfig,
}

impl RetryExecutor {
    /// Create a retry executor that never retries
    pub fn new() -> Self {
        Self::with_config(RetryConfig::default())
    }

    /// Create a new retry executor with configuration
    pub fn with_config(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Run `func` until it succeeds, fails with a non-retryable error, or
    /// the retry budget is spent
    pub async fn execute<F, Fut, T>(&self, mut func: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut delay = self.config.initial_delay;
        let mut attempt = 0;

        loop {
            match func().await {
                Ok(result) => return Ok(result),
                Err(error) if !error.is_retryable() || attempt >= self.config.max_retries => {
                    return Err(error);
                }
                Err(error) => {
                    attempt += 1;
                    warn!(
                        "Attempt {} failed: {}; retrying ({}/{})",
                        attempt, error, attempt, self.config.max_retries
                    );

                    tokio::time::sleep(delay + self.jitter(delay)).await;

                    delay = Duration::from_millis(
                        (delay.as_millis() as f64 * self.config.backoff_multiplier) as u64,
                    )
                    .min(self.config.max_delay);
                }
            }
        }
    }

    fn jitter(&self, delay: Duration) -> Duration {
        if self.config.jitter_factor <= 0.0 {
            return Duration::ZERO;
        }
        let jitter_range = delay.as_millis() as f64 * self.config.jitter_factor;
        let jitter = (rand::random::<f64>() - 0.5) * 2.0 * jitter_range;
        Duration::from_millis(jitter.abs() as u64)
    }
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::new()
    }
}
