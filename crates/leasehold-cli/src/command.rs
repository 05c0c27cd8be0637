//! Subcommands and their execution

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use clap::Subcommand;
use leasehold_mutex::{
    CancelSignal, LockRetryPolicy, MutexError, MutexService, RequestContext,
};
use leasehold_store::EmbeddedLockStore;
use serde_json::json;
use tracing::{error, info};

use crate::settings::Settings;

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Acquire the lease on an aggregate
    Lock {
        aggregate_id: String,
        owner_id: String,
        /// Back off and retry while another owner holds the lease
        #[arg(long)]
        retry: bool,
    },
    /// Release a lease held by the given owner
    Unlock {
        aggregate_id: String,
        owner_id: String,
    },
    /// Print the live lease on an aggregate as JSON
    Get { aggregate_id: String },
}

/// Process exit status for a failed command
pub fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<MutexError>() {
        Some(MutexError::AlreadyLocked) => 2,
        Some(MutexError::NotFound) => 3,
        Some(MutexError::InvalidOwner) => 4,
        Some(MutexError::Cancelled | MutexError::DeadlineExceeded) => 5,
        _ => 1,
    }
}

/// Report a failed command once.
///
/// The error is always logged; it is written to `stderr` only when no
/// console log layer is already printing it there.
pub fn report_failure<W: Write>(
    command: &Command,
    err: &anyhow::Error,
    console_logging: bool,
    stderr: &mut W,
) {
    error!(command = ?command, "Command failed: {:#}", err);
    if !console_logging {
        let _ = writeln!(stderr, "Error: {:#}", err);
    }
}

/// Build the request context from settings
pub fn request_context(settings: &Settings, cancel: CancelSignal) -> RequestContext {
    let ctx = RequestContext::background().with_cancel(cancel);
    match settings.request.timeout() {
        Some(timeout) => ctx.with_timeout(timeout),
        None => ctx,
    }
}

/// Open the embedded store and run `command` against it
pub async fn run<W: Write>(
    settings: &Settings,
    command: &Command,
    cancel: CancelSignal,
    out: &mut W,
) -> anyhow::Result<()> {
    let data_dir = &settings.store.data_dir;
    let store = EmbeddedLockStore::open(data_dir)
        .with_context(|| format!("Failed to open lock store at {}", data_dir.display()))?;
    let service = MutexService::new(Arc::new(store), settings.mutex.clone())?;

    let ctx = request_context(settings, cancel);
    execute(&service, &ctx, command, out).await
}

/// Run a single command, writing its JSON result to `out`
pub async fn execute<W: Write>(
    service: &MutexService,
    ctx: &RequestContext,
    command: &Command,
    out: &mut W,
) -> anyhow::Result<()> {
    let output = match command {
        Command::Lock {
            aggregate_id,
            owner_id,
            retry,
        } => {
            let attempts = if *retry {
                LockRetryPolicy::from_config(service.config())
                    .acquire(service, ctx, aggregate_id, owner_id)
                    .await?
            } else {
                service.lock(ctx, aggregate_id, owner_id).await?;
                1
            };
            info!(
                aggregate_id = %aggregate_id,
                owner_id = %owner_id,
                attempts,
                "Locked"
            );
            json!({
                "aggregate_id": aggregate_id,
                "owner_id": owner_id,
                "status": "locked",
                "attempts": attempts,
            })
        }
        Command::Unlock {
            aggregate_id,
            owner_id,
        } => {
            service.unlock(ctx, aggregate_id, owner_id).await?;
            info!(aggregate_id = %aggregate_id, owner_id = %owner_id, "Unlocked");
            json!({
                "aggregate_id": aggregate_id,
                "owner_id": owner_id,
                "status": "unlocked",
            })
        }
        Command::Get { aggregate_id } => {
            let lease = service.get(ctx, aggregate_id).await?;
            serde_json::to_value(&lease)?
        }
    };

    writeln!(out, "{}", serde_json::to_string_pretty(&output)?)?;
    Ok(())
}
