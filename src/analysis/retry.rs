//! Retry policy for completion calls.
//!
//! Retryable failures wait `base_delay * 2^attempt` before the next attempt
//! (2s, 4s, 8s, ... with the defaults). Anything else fails immediately.

use std::time::Duration;

use crate::analysis::client::{CompletionBackend, CompletionRequest};
use crate::error::CompletionError;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Delay after the failed attempt `attempt` (zero based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Run `request` against `backend`, retrying retryable failures.
    pub async fn call(
        &self,
        backend: &dyn CompletionBackend,
        request: &CompletionRequest,
    ) -> Result<String, CompletionError> {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match backend.complete(request).await {
                Ok(content) => return Ok(content),
                Err(e) if e.is_retryable() && attempt + 1 < max_attempts => {
                    let wait = self.delay_for(attempt);
                    log::warn!(
                        "COMPLETION_RETRY error={} wait_secs={} attempt={}/{}",
                        e,
                        wait.as_secs_f32(),
                        attempt + 1,
                        max_attempts
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
