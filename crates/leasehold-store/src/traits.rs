//! Lock store contract
//!
//! The mutex protocol needs exactly three primitives from its backing store.
//! Conditional writes must be evaluated by the store atomically with the
//! write; a read followed by a separate write does not satisfy this trait.

use async_trait::async_trait;

use crate::condition::Condition;
use crate::error::StoreError;
use crate::model::LeaseRecord;

#[async_trait]
pub trait LockStore: Send + Sync {
    /// Write `record` under its aggregate id only if `condition` holds for the
    /// existing item. Fails with [`StoreError::ConditionNotMet`] otherwise.
    async fn conditional_create(
        &self,
        table: &str,
        record: &LeaseRecord,
        condition: &Condition,
    ) -> Result<(), StoreError>;

    /// Delete the item under `aggregate_id` only if `condition` holds.
    /// Fails with [`StoreError::ConditionNotMet`] otherwise.
    async fn conditional_delete(
        &self,
        table: &str,
        aggregate_id: &str,
        condition: &Condition,
    ) -> Result<(), StoreError>;

    /// Point read. Fails with [`StoreError::NotFound`] when absent.
    async fn get(&self, table: &str, aggregate_id: &str) -> Result<LeaseRecord, StoreError>;
}
