//! Persisted lease record
//!
//! One row per locked aggregate. Field names are the store attribute names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Attribute holding the primary key
pub const ATTR_AGGREGATE_ID: &str = "aggregate_id";

/// Attribute holding the current holder
pub const ATTR_OWNER_ID: &str = "owner_id";

/// Attribute holding the lease expiry
pub const ATTR_TIMESTAMP: &str = "timestamp";

/// Lease row as stored by a [`LockStore`](crate::LockStore)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseRecord {
    /// Resource being protected, also the primary key
    pub aggregate_id: String,
    /// Current holder
    pub owner_id: String,
    /// Lease expiry
    #[serde(rename = "timestamp")]
    pub expiry: DateTime<Utc>,
}

impl LeaseRecord {
    pub fn new(
        aggregate_id: impl Into<String>,
        owner_id: impl Into<String>,
        expiry: DateTime<Utc>,
    ) -> Self {
        Self {
            aggregate_id: aggregate_id.into(),
            owner_id: owner_id.into(),
            expiry,
        }
    }

    /// A record is expired once `now` has moved strictly past its expiry.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry < now
    }

    pub fn is_owned_by(&self, owner_id: &str) -> bool {
        self.owner_id == owner_id
    }

    /// Storage key for a record in a logical table.
    ///
    /// The table name is length-prefixed so no `(table, aggregate_id)` pair
    /// can produce another pair's key, whatever either part contains.
    pub fn storage_key(table: &str, aggregate_id: &str) -> String {
        format!("{}:{}@@{}", table.len(), table, aggregate_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_expiry_boundary() {
        let record = LeaseRecord::new("alliance_1", "persona_1", at(100));

        assert!(!record.is_expired_at(at(99)));
        // Still valid at the expiry instant itself
        assert!(!record.is_expired_at(at(100)));
        assert!(record.is_expired_at(at(100) + Duration::milliseconds(1)));
    }

    #[test]
    fn test_serialized_layout() {
        let record = LeaseRecord::new("alliance_1", "persona_1", at(0));
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value[ATTR_AGGREGATE_ID], "alliance_1");
        assert_eq!(value[ATTR_OWNER_ID], "persona_1");
        assert_eq!(value[ATTR_TIMESTAMP], "1970-01-01T00:00:00Z");

        let back: LeaseRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_storage_key() {
        assert_eq!(LeaseRecord::storage_key("mutex", "a1"), "5:mutex@@a1");
    }

    #[test]
    fn test_storage_key_separator_in_ids() {
        assert_ne!(
            LeaseRecord::storage_key("mutex", "x@@y"),
            LeaseRecord::storage_key("mutex@@x", "y")
        );
        assert_ne!(
            LeaseRecord::storage_key("m@", "x"),
            LeaseRecord::storage_key("m", "@x")
        );
    }
}
