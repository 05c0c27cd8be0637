//! Lock store error types

/// Errors returned by a [`LockStore`](crate::LockStore)
///
/// `ConditionNotMet` and `NotFound` are protocol outcomes the caller is
/// expected to branch on. The remaining variants are failures of the store
/// itself; after one of those the state of a conditional write is unknown.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("conditional check failed")]
    ConditionNotMet,

    #[error("item not found")]
    NotFound,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_condition_not_met(&self) -> bool {
        matches!(self, StoreError::ConditionNotMet)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }
}
