// Embedded lock store using RocksDB
// Provides durable single-node storage for lease records

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rocksdb::{BlockBasedOptions, ColumnFamily, ColumnFamilyDescriptor, DB, Options, WriteOptions};
use tracing::debug;

use crate::condition::Condition;
use crate::error::StoreError;
use crate::model::LeaseRecord;
use crate::traits::LockStore;

/// Column family holding lease records
pub const CF_LOCKS: &str = "locks";

/// RocksDB-backed lock store
///
/// Values are JSON-encoded [`LeaseRecord`]s keyed by [`LeaseRecord::storage_key`].
/// RocksDB allows a single process to open a database, so a process-wide
/// write lock around read-evaluate-write makes conditional operations atomic.
pub struct EmbeddedLockStore {
    db: Arc<DB>,
    write_lock: Mutex<()>,
}

impl EmbeddedLockStore {
    /// Open (or create) a store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        // Point lookups dominate, so a bloom filter pays for itself
        let mut block_opts = BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);

        let mut cf_opts = Options::default();
        cf_opts.set_block_based_table_factory(&block_opts);

        let cfs = vec![ColumnFamilyDescriptor::new(CF_LOCKS, cf_opts)];

        let db = DB::open_cf_descriptors(&db_opts, path.as_ref(), cfs)
            .map_err(|e| StoreError::Backend(format!("RocksDB open error: {}", e)))?;

        debug!(path = %path.as_ref().display(), "Embedded lock store opened");

        Ok(Self {
            db: Arc::new(db),
            write_lock: Mutex::new(()),
        })
    }

    fn cf(&self) -> Result<&ColumnFamily, StoreError> {
        self.db
            .cf_handle(CF_LOCKS)
            .ok_or_else(|| StoreError::Backend(format!("Column family '{}' not found", CF_LOCKS)))
    }

    fn read(&self, key: &str) -> Result<Option<LeaseRecord>, StoreError> {
        let cf = self.cf()?;
        let bytes = self
            .db
            .get_cf(cf, key.as_bytes())
            .map_err(|e| StoreError::Backend(format!("RocksDB get error: {}", e)))?;

        match bytes {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn sync_write_opts() -> WriteOptions {
        let mut opts = WriteOptions::default();
        opts.set_sync(true);
        opts
    }
}

#[async_trait]
impl LockStore for EmbeddedLockStore {
    async fn conditional_create(
        &self,
        table: &str,
        record: &LeaseRecord,
        condition: &Condition,
    ) -> Result<(), StoreError> {
        let key = LeaseRecord::storage_key(table, &record.aggregate_id);
        let value = serde_json::to_vec(record)?;

        let _guard = self.write_lock.lock();
        let existing = self.read(&key)?;
        if !condition.evaluate(existing.as_ref()) {
            return Err(StoreError::ConditionNotMet);
        }

        self.db
            .put_cf_opt(self.cf()?, key.as_bytes(), value, &Self::sync_write_opts())
            .map_err(|e| StoreError::Backend(format!("RocksDB put error: {}", e)))?;

        debug!(key = %key, owner_id = %record.owner_id, "Lease record written");
        Ok(())
    }

    async fn conditional_delete(
        &self,
        table: &str,
        aggregate_id: &str,
        condition: &Condition,
    ) -> Result<(), StoreError> {
        let key = LeaseRecord::storage_key(table, aggregate_id);

        let _guard = self.write_lock.lock();
        let existing = self.read(&key)?;
        if !condition.evaluate(existing.as_ref()) {
            return Err(StoreError::ConditionNotMet);
        }
        if existing.is_none() {
            return Ok(());
        }

        self.db
            .delete_cf_opt(self.cf()?, key.as_bytes(), &Self::sync_write_opts())
            .map_err(|e| StoreError::Backend(format!("RocksDB delete error: {}", e)))?;

        debug!(key = %key, "Lease record deleted");
        Ok(())
    }

    async fn get(&self, table: &str, aggregate_id: &str) -> Result<LeaseRecord, StoreError> {
        let key = LeaseRecord::storage_key(table, aggregate_id);
        self.read(&key)?.ok_or(StoreError::NotFound)
    }
}
