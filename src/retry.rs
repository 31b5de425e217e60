//! Retry logic with exponential backoff
//!
//! Transient request failures (throttling, server errors, timeouts) can be retried
//! with exponential backoff. With the default configuration (`max_attempts = 0`)
//! every request runs once.
//!
//! ```no_run
//! use screens_dl::config::RetryConfig;
//! use screens_dl::retry::with_retry;
//!
//! # async fn example(fetch: impl Fn() -> std::future::Ready<screens_dl::Result<Vec<u8>>>) -> screens_dl::Result<()> {
//! let config = RetryConfig { max_attempts: 3, ..Default::default() };
//! let body = with_retry(&config, || fetch()).await?;
//! # let _ = body;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::Error;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Classifies errors as transient or permanent
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            Error::Network(e) => e.is_timeout() || e.is_connect(),
            // 429 Too Many Requests and server-side failures
            Error::Status { status, .. } => *status == 429 || *status >= 500,
            Error::ScreenDownload { source, .. } => source.is_retryable(),
            Error::Config { .. }
            | Error::Schema { .. }
            | Error::Write { .. }
            | Error::TaskFailed(_)
            | Error::Other(_) => false,
        }
    }
}

/// Run `operation`, retrying transient failures up to `config.max_attempts` times
///
/// Returns the first success, or the error that ended the attempts.
pub async fn with_retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut delay = config.initial_delay;
    for attempt in 1..=config.max_attempts {
        match operation().await {
            Err(e) if e.is_retryable() => {
                tracing::warn!(
                    error = %e,
                    attempt,
                    max_attempts = config.max_attempts,
                    "Transient request failure, retrying"
                );
                let pause = if config.jitter { add_jitter(delay) } else { delay };
                tokio::time::sleep(pause).await;
                delay = delay.mul_f64(config.backoff_multiplier).min(config.max_delay);
            }
            done => return done,
        }
    }
    // Last (or only) attempt
    operation().await
}

/// Add random jitter to a delay, somewhere between `delay` and `2 * delay`
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    Duration::from_secs_f64(delay.as_secs_f64() * (1.0 + jitter_factor))
}
