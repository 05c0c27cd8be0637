//! In-memory lock store
//!
//! Conditional operations run while holding the DashMap shard lock for the
//! key, so evaluation and write are atomic within the process.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::trace;

use crate::condition::Condition;
use crate::error::StoreError;
use crate::model::LeaseRecord;
use crate::traits::LockStore;

#[derive(Debug, Default)]
pub struct MemoryLockStore {
    items: DashMap<String, LeaseRecord>,
}

impl MemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, expired ones included
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[async_trait]
impl LockStore for MemoryLockStore {
    async fn conditional_create(
        &self,
        table: &str,
        record: &LeaseRecord,
        condition: &Condition,
    ) -> Result<(), StoreError> {
        let key = LeaseRecord::storage_key(table, &record.aggregate_id);

        match self.items.entry(key) {
            Entry::Occupied(mut entry) => {
                if !condition.evaluate(Some(entry.get())) {
                    return Err(StoreError::ConditionNotMet);
                }
                entry.insert(record.clone());
            }
            Entry::Vacant(entry) => {
                if !condition.evaluate(None) {
                    return Err(StoreError::ConditionNotMet);
                }
                entry.insert(record.clone());
            }
        }

        trace!(table = %table, aggregate_id = %record.aggregate_id, "Lease record written");
        Ok(())
    }

    async fn conditional_delete(
        &self,
        table: &str,
        aggregate_id: &str,
        condition: &Condition,
    ) -> Result<(), StoreError> {
        let key = LeaseRecord::storage_key(table, aggregate_id);

        match self.items.entry(key) {
            Entry::Occupied(entry) => {
                if !condition.evaluate(Some(entry.get())) {
                    return Err(StoreError::ConditionNotMet);
                }
                entry.remove();
                trace!(table = %table, aggregate_id = %aggregate_id, "Lease record deleted");
                Ok(())
            }
            Entry::Vacant(_) => {
                if condition.evaluate(None) {
                    Ok(())
                } else {
                    Err(StoreError::ConditionNotMet)
                }
            }
        }
    }

    async fn get(&self, table: &str, aggregate_id: &str) -> Result<LeaseRecord, StoreError> {
        let key = LeaseRecord::storage_key(table, aggregate_id);
        self.items
            .get(&key)
            .map(|r| r.value().clone())
            .ok_or(StoreError::NotFound)
    }
}
