//! Mutex protocol error types

use leasehold_store::StoreError;

/// Errors returned by [`MutexService`](crate::MutexService)
#[derive(thiserror::Error, Debug)]
pub enum MutexError {
    /// Candidate lease expiry is not in the future; never reaches the store
    #[error("invalid expiry")]
    InvalidExpiry,

    /// Unlock attempted by a caller that does not hold the lease
    #[error("invalid owner id")]
    InvalidOwner,

    /// Another owner holds a live lease
    #[error("aggregate already locked")]
    AlreadyLocked,

    /// No live lease exists
    #[error("lease not found")]
    NotFound,

    #[error("caused: {0}")]
    InvalidArgument(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// Underlying store failure; the lock state is indeterminate
    #[error("store error: {0}")]
    Store(#[source] StoreError),
}

impl MutexError {
    /// Whether backing off and trying again can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, MutexError::AlreadyLocked)
    }

    /// Whether a write may or may not have been applied
    pub fn is_indeterminate(&self) -> bool {
        matches!(
            self,
            MutexError::Store(_) | MutexError::Cancelled | MutexError::DeadlineExceeded
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutex_error_display() {
        assert_eq!(MutexError::InvalidExpiry.to_string(), "invalid expiry");
        assert_eq!(MutexError::InvalidOwner.to_string(), "invalid owner id");
        assert_eq!(
            MutexError::InvalidArgument("owner_id is empty".to_string()).to_string(),
            "caused: owner_id is empty"
        );
        assert_eq!(
            MutexError::Store(StoreError::Backend("timeout".to_string())).to_string(),
            "store error: backend error: timeout"
        );
    }

    #[test]
    fn test_error_classification() {
        assert!(MutexError::AlreadyLocked.is_retryable());
        assert!(!MutexError::InvalidOwner.is_retryable());
        assert!(!MutexError::Cancelled.is_retryable());

        assert!(MutexError::Store(StoreError::Backend(String::new())).is_indeterminate());
        assert!(MutexError::Cancelled.is_indeterminate());
        assert!(MutexError::DeadlineExceeded.is_indeterminate());
        assert!(!MutexError::AlreadyLocked.is_indeterminate());
        assert!(!MutexError::NotFound.is_indeterminate());
    }
}
