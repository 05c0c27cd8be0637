//! Leasehold Store - lock store contract and backends
//!
//! This crate provides:
//! - The `LockStore` trait consumed by the mutex service
//! - The persisted `LeaseRecord` row and `Condition` expressions
//! - An in-memory backend (DashMap)
//! - An embedded backend (RocksDB)

pub mod condition;
pub mod embedded;
pub mod error;
pub mod memory;
pub mod model;
pub mod traits;

pub use condition::Condition;
pub use embedded::EmbeddedLockStore;
pub use error::StoreError;
pub use memory::MemoryLockStore;
pub use model::LeaseRecord;
pub use traits::LockStore;
