//! Startup retry for the persistent store connection.
//!
//! Request-path work is never retried: a failed provider call falls back to
//! the source text instead.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Doubling backoff, capped at `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Backoff {
    /// 5 attempts, waiting 1s, 2s, 4s, 8s in between.
    pub fn database_connect() -> Self {
        Self {
            attempts: 5,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(8),
        }
    }

    /// Wait before retry number `retry` (1-based).
    fn delay_before(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry.saturating_sub(1)).unwrap_or(u32::MAX);
        self.initial_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}

/// Run `operation` until it succeeds or `backoff.attempts` are used up,
/// returning the last error. At least one attempt is always made.
pub async fn with_retry<T, E, F, Fut>(backoff: &Backoff, what: &str, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let attempts = backoff.attempts.max(1);
    let mut retry = 0;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if retry + 1 >= attempts => {
                warn!("{} failed after {} attempt(s): {}", what, attempts, e);
                return Err(e);
            }
            Err(e) => {
                retry += 1;
                let delay = backoff.delay_before(retry);
                warn!("{} failed ({}), retrying in {:?}", what, e, delay);
                sleep(delay).await;
            }
        }
    }
}
