//! Request context: deadline and cancellation
//!
//! Every mutex operation runs its store call through [`RequestContext::run`].
//! If the deadline passes or the cancel signal fires first, the store future
//! is dropped and the operation reports `DeadlineExceeded` or `Cancelled`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::MutexError;

/// Cloneable cancellation trigger shared between a caller and its requests
#[derive(Clone, Debug)]
pub struct CancelSignal {
    sender: Arc<watch::Sender<bool>>,
}

impl CancelSignal {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Trigger cancellation; idempotent
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolves once [`cancel`](Self::cancel) has been called
    pub async fn cancelled(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender lives as long as `self`, so this only returns once set
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Deadline and cancellation attached to a single operation
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    deadline: Option<Instant>,
    cancel: Option<CancelSignal>,
}

impl RequestContext {
    /// Context with neither deadline nor cancellation
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Set the deadline, keeping the earlier one if already set
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fail fast if the context is already done
    pub fn check(&self) -> Result<(), MutexError> {
        if self.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
            return Err(MutexError::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(MutexError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Drive `future` to completion unless the context finishes first
    pub async fn run<F, T>(&self, future: F) -> Result<T, MutexError>
    where
        F: Future<Output = T>,
    {
        self.check()?;

        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };
        let cancelled = async {
            match &self.cancel {
                Some(cancel) => cancel.cancelled().await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => Err(MutexError::Cancelled),
            _ = deadline => Err(MutexError::DeadlineExceeded),
            output = future => Ok(output),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_background_runs_to_completion() {
        let ctx = RequestContext::background();
        assert_eq!(ctx.run(async { 42 }).await.unwrap(), 42);
        assert!(ctx.deadline().is_none());
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let cancel = CancelSignal::new();
        cancel.cancel();
        let ctx = RequestContext::background().with_cancel(cancel);

        assert!(matches!(ctx.check(), Err(MutexError::Cancelled)));
        assert!(matches!(
            ctx.run(async { 1 }).await,
            Err(MutexError::Cancelled)
        ));
    }

    #[tokio::test]
    async fn test_cancel_interrupts_pending_future() {
        let cancel = CancelSignal::new();
        let ctx = RequestContext::background().with_cancel(cancel.clone());

        let trigger = tokio::spawn(async move {
            tokio::task::yield_now().await;
            cancel.cancel();
        });

        let result = ctx.run(std::future::pending::<()>()).await;
        assert!(matches!(result, Err(MutexError::Cancelled)));
        trigger.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_interrupts_slow_future() {
        let ctx = RequestContext::background().with_timeout(Duration::from_millis(50));

        let result = ctx
            .run(tokio::time::sleep(Duration::from_secs(10)))
            .await;
        assert!(matches!(result, Err(MutexError::DeadlineExceeded)));
        assert!(matches!(ctx.check(), Err(MutexError::DeadlineExceeded)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_earlier_deadline_wins() {
        let now = Instant::now();
        let ctx = RequestContext::background()
            .with_deadline(now + Duration::from_secs(5))
            .with_deadline(now + Duration::from_secs(1))
            .with_deadline(now + Duration::from_secs(3));
        assert_eq!(ctx.deadline(), Some(now + Duration::from_secs(1)));
    }
}
