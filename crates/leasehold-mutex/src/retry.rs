//! Caller-side lock retry
//!
//! [`MutexService::lock`] makes exactly one attempt. Callers that would rather
//! wait for a contended aggregate can opt into [`LockRetryPolicy`], which
//! retries on `AlreadyLocked` only, with capped exponential backoff.

use std::time::Duration;

use tracing::debug;

use crate::config::MutexConfig;
use crate::context::RequestContext;
use crate::error::MutexError;
use crate::service::MutexService;

/// Upper bound on the backoff exponent
const MAX_BACKOFF_SHIFT: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockRetryPolicy {
    max_attempts: u32,
    base_backoff: Duration,
    max_backoff: Duration,
}

impl LockRetryPolicy {
    pub fn new(max_attempts: u32, base_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_backoff,
            max_backoff: max_backoff.max(base_backoff),
        }
    }

    pub fn from_config(config: &MutexConfig) -> Self {
        Self::new(
            config.max_lock_attempts.unwrap_or(1),
            config.retry_backoff(),
            config.max_retry_backoff(),
        )
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Backoff to sleep after the given failed attempt (1-based)
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(MAX_BACKOFF_SHIFT);
        self.base_backoff
            .saturating_mul(1u32 << shift)
            .min(self.max_backoff)
    }

    /// Lock with retries; returns the number of attempts used on success.
    ///
    /// Any error other than `AlreadyLocked` is returned immediately. Backoff
    /// sleeps honor the context's deadline and cancellation.
    pub async fn acquire(
        &self,
        service: &MutexService,
        ctx: &RequestContext,
        aggregate_id: &str,
        owner_id: &str,
    ) -> Result<u32, MutexError> {
        let mut attempt = 1;
        loop {
            match service.lock(ctx, aggregate_id, owner_id).await {
                Ok(()) => return Ok(attempt),
                Err(MutexError::AlreadyLocked) if attempt < self.max_attempts => {
                    let backoff = self.backoff_after(attempt);
                    debug!(
                        aggregate_id = %aggregate_id,
                        owner_id = %owner_id,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        "Lock contended, backing off"
                    );
                    ctx.run(tokio::time::sleep(backoff)).await?;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for LockRetryPolicy {
    fn default() -> Self {
        Self::from_config(&MutexConfig::default())
    }
}
