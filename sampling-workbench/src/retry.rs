// sampling-workbench/src/retry.rs
//! Exponential backoff with jitter around any fallible async operation.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use sampling_protocol::constants::defaults;
use sampling_protocol::ProviderError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Failures that know whether another attempt could succeed
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for ProviderError {
    fn is_retryable(&self) -> bool {
        ProviderError::is_retryable(self)
    }
}

/// Why a retried operation did not produce a value
#[derive(Debug, Error)]
pub enum RetryError<E> {
    #[error("gave up after {attempts} attempt(s): {error}")]
    Failed { attempts: u32, error: E },

    #[error("cancelled after {attempts} attempt(s)")]
    Cancelled { attempts: u32 },
}

/// Retry settings as they appear in configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter_ratio: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::MAX_ATTEMPTS,
            initial_delay_ms: defaults::INITIAL_DELAY_MS,
            max_delay_ms: defaults::MAX_DELAY_MS,
            jitter_ratio: defaults::JITTER_RATIO,
        }
    }
}

/// Backoff executor. Holds no shared state; each `run` is independent.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    max_delay: Duration,
    jitter_ratio: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            jitter_ratio: config.jitter_ratio.clamp(0.0, 1.0),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the default delay cap and jitter
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            ..Self::default()
        }
    }

    pub fn with_jitter_ratio(mut self, jitter_ratio: f64) -> Self {
        self.jitter_ratio = jitter_ratio.clamp(0.0, 1.0);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay after the given zero-based failed attempt, before jitter
    pub fn base_delay(&self, attempt: u32) -> Duration {
        self.initial_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay)
    }

    fn jittered_delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        base + base.mul_f64(self.jitter_ratio * rand::random::<f64>())
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// exhausts the attempt budget, or `cancel` fires.
    ///
    /// The operation receives the zero-based attempt number.
    pub async fn run<T, E, F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut operation: F,
    ) -> Result<T, RetryError<E>>
    where
        E: Retryable + fmt::Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 0;
        loop {
            if cancel.is_cancelled() {
                return Err(RetryError::Cancelled { attempts: attempt });
            }

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(RetryError::Cancelled { attempts: attempt + 1 });
                }
                outcome = operation(attempt) => outcome,
            };
            let error = match outcome {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };
            let attempts = attempt + 1;

            if !error.is_retryable() {
                debug!(attempts, %error, "Not retrying non-retryable failure");
                return Err(RetryError::Failed { attempts, error });
            }
            if attempts >= self.max_attempts {
                warn!(attempts, %error, "Retry budget exhausted");
                return Err(RetryError::Failed { attempts, error });
            }

            let delay = self.jittered_delay(attempt);
            warn!(attempt = attempts, delay_ms = delay.as_millis() as u64, %error, "Attempt failed, backing off");

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(RetryError::Cancelled { attempts });
                }
                _ = tokio::time::sleep(delay) => {}
            }
            attempt = attempts;
        }
    }
}

/// Run `operation` with `max_attempts` and `initial_delay`, using default jitter
pub async fn run_with_backoff<T, E, F, Fut>(
    operation: F,
    max_attempts: u32,
    initial_delay: Duration,
    cancel: &CancellationToken,
) -> Result<T, RetryError<E>>
where
    E: Retryable + fmt::Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    RetryPolicy::new(max_attempts, initial_delay)
        .run(cancel, operation)
        .await
}
