//! Request-rate limiting over a rolling window
//!
//! The [`RateLimiter`] keeps a log of the instants at which requests were
//! dispatched. A request may go out when fewer than `max_requests` entries fall
//! inside the last `window`; otherwise it waits until the oldest entry ages out.
//! Waiters queue on a fair mutex, so they are released in arrival order.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use super::{Request, Transport};
use crate::config::RateLimitConfig;
use crate::error::Result;

/// Global request limiter shared across every caller
///
/// Cloning is cheap and every clone shares the same dispatch log.
#[derive(Clone)]
pub struct RateLimiter {
    /// Requests allowed per window
    max_requests: usize,
    /// Rolling window length
    window: Duration,
    /// Dispatch instants still inside the window, oldest first
    dispatched: Arc<Mutex<VecDeque<Instant>>>,
}

impl RateLimiter {
    /// Create a limiter allowing `max_requests` per rolling `window`
    ///
    /// A `max_requests` of zero is treated as one.
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        let max_requests = max_requests.max(1);
        Self {
            max_requests,
            window,
            dispatched: Arc::new(Mutex::new(VecDeque::with_capacity(max_requests))),
        }
    }

    /// Create a limiter from configuration
    #[must_use]
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, config.window)
    }

    /// Wait until one more request may be dispatched, and record it
    ///
    /// There is no deadline: under sustained overload callers simply wait longer.
    pub async fn acquire(&self) {
        // Holding the lock while sleeping keeps later callers queued behind us.
        let mut dispatched = self.dispatched.lock().await;
        loop {
            let now = Instant::now();
            while let Some(&oldest) = dispatched.front() {
                if now.duration_since(oldest) >= self.window {
                    dispatched.pop_front();
                } else {
                    break;
                }
            }

            if dispatched.len() < self.max_requests {
                dispatched.push_back(now);
                return;
            }

            if let Some(&oldest) = dispatched.front() {
                tracing::trace!(
                    queued_for_ms = (oldest + self.window - now).as_millis() as u64,
                    "Request quota exhausted, waiting"
                );
                tokio::time::sleep_until(oldest + self.window).await;
            }
        }
    }

    /// Requests recorded inside the current window
    pub async fn in_window(&self) -> usize {
        let dispatched = self.dispatched.lock().await;
        let now = Instant::now();
        dispatched
            .iter()
            .filter(|&&at| now.duration_since(at) < self.window)
            .count()
    }
}

/// A [`Transport`] that passes every request through a shared [`RateLimiter`]
pub struct RateLimitedTransport {
    inner: Arc<dyn Transport>,
    limiter: RateLimiter,
}

impl RateLimitedTransport {
    /// Wrap `inner` so that its requests respect `limiter`
    pub fn new(inner: Arc<dyn Transport>, limiter: RateLimiter) -> Self {
        Self { inner, limiter }
    }

    /// The limiter shared by this transport
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }
}

#[async_trait::async_trait]
impl Transport for RateLimitedTransport {
    async fn get(&self, request: Request) -> Result<Vec<u8>> {
        self.limiter.acquire().await;
        self.inner.get(request).await
    }
}
