//! Leasehold Mutex - lease-based distributed mutual exclusion
//!
//! Grants exclusive, time-bounded ownership of an aggregate to one caller at a
//! time across processes that share nothing but a lock store. Correctness
//! rests entirely on the store's conditional writes:
//! - `lock` creates a lease only if none is live (or the live one is ours)
//! - `unlock` deletes a lease only if the caller still holds it
//! - `get` treats expired leases as absent
//!
//! # Example
//!
//! ```rust,ignore
//! let store = Arc::new(MemoryLockStore::new());
//! let mutex = MutexService::new(store, MutexConfig::default())?;
//! let ctx = RequestContext::background().with_timeout(Duration::from_secs(2));
//!
//! mutex.lock(&ctx, "alliance_1", "persona_1").await?;
//! // ... critical section, bounded by the lease duration ...
//! mutex.unlock(&ctx, "alliance_1", "persona_1").await?;
//! ```

pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod model;
pub mod retry;
pub mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::MutexConfig;
pub use context::{CancelSignal, RequestContext};
pub use error::MutexError;
pub use model::LeaseDocument;
pub use retry::LockRetryPolicy;
pub use service::MutexService;

// Re-export the store contract for hosts wiring a backend
pub use leasehold_store;
