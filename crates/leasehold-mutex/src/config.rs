// Mutex configuration
// Passed to the mutex service at construction

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::MutexError;

/// Configuration for the mutex service
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MutexConfig {
    /// Store table holding lease records (default: "mutex")
    pub table: String,

    /// Lease lifetime in milliseconds (default: 1000ms)
    /// Every successful lock expires this long after it was taken
    pub lease_duration_ms: u64,

    /// Attempt bound for the caller-side retry helper (default: 10)
    /// `None` means a single attempt. The lock operation itself never retries.
    pub max_lock_attempts: Option<u32>,

    /// First backoff between retry attempts in milliseconds (default: 100ms)
    pub retry_backoff_ms: u64,

    /// Upper bound on backoff between retry attempts in milliseconds (default: 5000ms)
    pub max_retry_backoff_ms: u64,
}

impl Default for MutexConfig {
    fn default() -> Self {
        Self {
            table: "mutex".to_string(),
            lease_duration_ms: 1000,
            max_lock_attempts: Some(10),
            retry_backoff_ms: 100,
            max_retry_backoff_ms: 5000,
        }
    }
}

impl MutexConfig {
    pub fn new(table: impl Into<String>, lease_duration: Duration) -> Self {
        Self {
            table: table.into(),
            lease_duration_ms: lease_duration.as_millis().min(u64::MAX as u128) as u64,
            ..Default::default()
        }
    }

    pub fn with_max_lock_attempts(mut self, max_lock_attempts: Option<u32>) -> Self {
        self.max_lock_attempts = max_lock_attempts;
        self
    }

    pub fn lease_duration(&self) -> Duration {
        Duration::from_millis(self.lease_duration_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn max_retry_backoff(&self) -> Duration {
        Duration::from_millis(self.max_retry_backoff_ms)
    }

    /// Reject settings no service can run with.
    ///
    /// A zero lease duration is accepted here; it surfaces as `InvalidExpiry`
    /// on every lock attempt instead.
    pub fn validate(&self) -> Result<(), MutexError> {
        if self.table.trim().is_empty() {
            return Err(MutexError::InvalidArgument(
                "table name must not be empty".to_string(),
            ));
        }
        if self.max_lock_attempts == Some(0) {
            return Err(MutexError::InvalidArgument(
                "max_lock_attempts must be at least 1".to_string(),
            ));
        }
        if self.retry_backoff_ms > self.max_retry_backoff_ms {
            return Err(MutexError::InvalidArgument(format!(
                "retry_backoff_ms ({}) exceeds max_retry_backoff_ms ({})",
                self.retry_backoff_ms, self.max_retry_backoff_ms
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MutexConfig::default();
        assert_eq!(config.table, "mutex");
        assert_eq!(config.lease_duration(), Duration::from_secs(1));
        assert_eq!(config.max_lock_attempts, Some(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: MutexConfig =
            serde_json::from_str(r#"{"table":"locks","lease_duration_ms":30000}"#).unwrap();
        assert_eq!(config.table, "locks");
        assert_eq!(config.lease_duration(), Duration::from_secs(30));
        assert_eq!(config.retry_backoff(), Duration::from_millis(100));
        assert_eq!(config.max_retry_backoff(), Duration::from_secs(5));
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let empty_table = MutexConfig::new(" ", Duration::from_secs(1));
        assert!(matches!(
            empty_table.validate(),
            Err(MutexError::InvalidArgument(_))
        ));

        let zero_attempts = MutexConfig::default().with_max_lock_attempts(Some(0));
        assert!(zero_attempts.validate().is_err());

        let inverted = MutexConfig {
            retry_backoff_ms: 10_000,
            ..Default::default()
        };
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn test_zero_lease_duration_is_valid_config() {
        let config = MutexConfig::new("mutex", Duration::ZERO);
        assert!(config.validate().is_ok());
    }
}
