//! Lease document

use std::time::Duration;

use chrono::{DateTime, Utc};
use leasehold_store::LeaseRecord;
use serde::{Deserialize, Serialize};

/// A time-bounded exclusive claim on an aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseDocument {
    pub aggregate_id: String,
    pub owner_id: String,
    pub expiry: DateTime<Utc>,
}

impl LeaseDocument {
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

    /// Candidate lease starting at `now`. `None` if the expiry cannot be
    /// represented.
    pub fn starting_at(
        aggregate_id: &str,
        owner_id: &str,
        now: DateTime<Utc>,
        lease_duration: Duration,
    ) -> Option<Self> {
        let duration = chrono::Duration::from_std(lease_duration).ok()?;
        let expiry = now.checked_add_signed(duration)?;
        Some(Self::new(aggregate_id, owner_id, expiry))
    }

    pub fn is_owned_by(&self, owner_id: &str) -> bool {
        self.owner_id == owner_id
    }
}

impl From<LeaseRecord> for LeaseDocument {
    fn from(record: LeaseRecord) -> Self {
        Self {
            aggregate_id: record.aggregate_id,
            owner_id: record.owner_id,
            expiry: record.expiry,
        }
    }
}

impl From<&LeaseDocument> for LeaseRecord {
    fn from(doc: &LeaseDocument) -> Self {
        LeaseRecord::new(doc.aggregate_id.clone(), doc.owner_id.clone(), doc.expiry)
    }
}
