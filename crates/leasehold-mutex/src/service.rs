//! Mutex service
//!
//! Provides:
//! - Lock: conditional create of a lease ("absent OR expired OR ours")
//! - Unlock: owner-verified conditional delete, idempotent
//! - Get: point read with reader-side expiry
//!
//! Every operation is one round-trip against the lock store. No lease state is
//! cached between calls, and expired leases are only reclaimed lazily by the
//! next lock attempt.

use std::sync::Arc;

use leasehold_store::{Condition, LeaseRecord, LockStore, StoreError};
use tracing::{debug, trace};

use crate::clock::{Clock, SystemClock};
use crate::config::MutexConfig;
use crate::context::RequestContext;
use crate::error::MutexError;
use crate::model::LeaseDocument;

/// Lease-based mutex over a [`LockStore`]
#[derive(Clone)]
pub struct MutexService {
    store: Arc<dyn LockStore>,
    config: Arc<MutexConfig>,
    clock: Arc<dyn Clock>,
}

impl MutexService {
    pub fn new(store: Arc<dyn LockStore>, config: MutexConfig) -> Result<Self, MutexError> {
        config.validate()?;
        Ok(Self {
            store,
            config: Arc::new(config),
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the clock used for expiry decisions
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &MutexConfig {
        &self.config
    }

    /// Acquire the lease on `aggregate_id` for `owner_id`.
    ///
    /// Succeeds when no live lease exists, or when the live lease already
    /// belongs to `owner_id`, in which case its expiry is pushed out.
    /// Returns `AlreadyLocked` when another owner holds a live lease. On a
    /// `Store`, `Cancelled` or `DeadlineExceeded` error the caller must not
    /// assume ownership.
    pub async fn lock(
        &self,
        ctx: &RequestContext,
        aggregate_id: &str,
        owner_id: &str,
    ) -> Result<(), MutexError> {
        validate_id("aggregate_id", aggregate_id)?;
        validate_id("owner_id", owner_id)?;

        let now = self.clock.now();
        let lease = LeaseDocument::starting_at(
            aggregate_id,
            owner_id,
            now,
            self.config.lease_duration(),
        )
        .ok_or(MutexError::InvalidExpiry)?;
        if lease.expiry <= now {
            return Err(MutexError::InvalidExpiry);
        }

        let record = LeaseRecord::from(&lease);
        let condition = Condition::lockable(owner_id, now);
        trace!(aggregate_id = %aggregate_id, condition = %condition, "Attempting lock");

        match ctx
            .run(
                self.store
                    .conditional_create(&self.config.table, &record, &condition),
            )
            .await?
        {
            Ok(()) => {
                metrics::counter!("leasehold_lock_acquired_total", "table" => self.config.table.clone())
                    .increment(1);
                debug!(
                    aggregate_id = %aggregate_id,
                    owner_id = %owner_id,
                    expiry = %lease.expiry,
                    "Lock acquired"
                );
                Ok(())
            }
            Err(StoreError::ConditionNotMet) => {
                metrics::counter!("leasehold_lock_contended_total", "table" => self.config.table.clone())
                    .increment(1);
                debug!(aggregate_id = %aggregate_id, owner_id = %owner_id, "Lock held by another owner");
                Err(MutexError::AlreadyLocked)
            }
            Err(e) => Err(self.store_failure(e)),
        }
    }

    /// Release the lease on `aggregate_id` held by `owner_id`.
    ///
    /// Releasing an absent or expired lease is a no-op. Returns `InvalidOwner`
    /// when a live lease belongs to someone else.
    pub async fn unlock(
        &self,
        ctx: &RequestContext,
        aggregate_id: &str,
        owner_id: &str,
    ) -> Result<(), MutexError> {
        validate_id("owner_id", owner_id)?;

        let lease = match self.get(ctx, aggregate_id).await {
            Ok(lease) => lease,
            Err(MutexError::NotFound) => {
                debug!(aggregate_id = %aggregate_id, "Unlock of absent lease, nothing to do");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        if !lease.is_owned_by(owner_id) {
            return Err(MutexError::InvalidOwner);
        }

        // Gate on the owner again at delete time; the lease may have lapsed and
        // been taken over since the read above.
        let condition = Condition::owned_by(owner_id);
        match ctx
            .run(
                self.store
                    .conditional_delete(&self.config.table, aggregate_id, &condition),
            )
            .await?
        {
            Ok(()) => {
                metrics::counter!("leasehold_unlock_total", "table" => self.config.table.clone())
                    .increment(1);
                debug!(aggregate_id = %aggregate_id, owner_id = %owner_id, "Lock released");
                Ok(())
            }
            Err(StoreError::ConditionNotMet) => {
                debug!(
                    aggregate_id = %aggregate_id,
                    owner_id = %owner_id,
                    "Lease changed hands before delete, treating unlock as done"
                );
                Ok(())
            }
            Err(e) => Err(self.store_failure(e)),
        }
    }

    /// Read the live lease on `aggregate_id`.
    ///
    /// A missing record and an expired record both yield `NotFound`.
    pub async fn get(
        &self,
        ctx: &RequestContext,
        aggregate_id: &str,
    ) -> Result<LeaseDocument, MutexError> {
        validate_id("aggregate_id", aggregate_id)?;

        let record = match ctx
            .run(self.store.get(&self.config.table, aggregate_id))
            .await?
        {
            Ok(record) => record,
            Err(StoreError::NotFound) => return Err(MutexError::NotFound),
            Err(e) => return Err(self.store_failure(e)),
        };

        if record.is_expired_at(self.clock.now()) {
            trace!(aggregate_id = %aggregate_id, expiry = %record.expiry, "Stale lease record");
            return Err(MutexError::NotFound);
        }

        Ok(record.into())
    }

    fn store_failure(&self, e: StoreError) -> MutexError {
        metrics::counter!("leasehold_store_errors_total", "table" => self.config.table.clone())
            .increment(1);
        MutexError::Store(e)
    }
}

fn validate_id(field: &str, value: &str) -> Result<(), MutexError> {
    if value.is_empty() {
        return Err(MutexError::InvalidArgument(format!("{} is empty", field)));
    }
    Ok(())
}
