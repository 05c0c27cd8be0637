// Integration tests for the leasehold host
// Each command reopens the embedded store, the way separate process invocations would

use std::path::Path;

use leasehold_cli::{Command, Settings, exit_code, run};
use leasehold_mutex::CancelSignal;
use tempfile::TempDir;

fn settings_for(dir: &Path, lease_ms: u64) -> Settings {
    let mut settings = Settings::default();
    settings.store.data_dir = dir.to_path_buf();
    settings.mutex.lease_duration_ms = lease_ms;
    settings
}

async fn invoke(settings: &Settings, command: Command) -> anyhow::Result<serde_json::Value> {
    let mut out = Vec::new();
    run(settings, &command, CancelSignal::new(), &mut out).await?;
    Ok(serde_json::from_slice(&out)?)
}

fn lock(owner_id: &str) -> Command {
    Command::Lock {
        aggregate_id: "alliance_1".to_string(),
        owner_id: owner_id.to_string(),
        retry: false,
    }
}

fn unlock(owner_id: &str) -> Command {
    Command::Unlock {
        aggregate_id: "alliance_1".to_string(),
        owner_id: owner_id.to_string(),
    }
}

fn get() -> Command {
    Command::Get {
        aggregate_id: "alliance_1".to_string(),
    }
}

#[tokio::test]
async fn test_lock_handoff_across_invocations() {
    let temp_dir = TempDir::new().unwrap();
    let settings = settings_for(temp_dir.path(), 60_000);

    invoke(&settings, lock("persona_1")).await.unwrap();

    let err = invoke(&settings, lock("persona_2")).await.unwrap_err();
    assert_eq!(exit_code(&err), 2);

    let lease = invoke(&settings, get()).await.unwrap();
    assert_eq!(lease["owner_id"], "persona_1");

    let released = invoke(&settings, unlock("persona_1")).await.unwrap();
    assert_eq!(released["status"], "unlocked");

    invoke(&settings, lock("persona_2")).await.unwrap();
    let lease = invoke(&settings, get()).await.unwrap();
    assert_eq!(lease["owner_id"], "persona_2");
}

#[tokio::test]
async fn test_retry_waits_out_short_lease() {
    let temp_dir = TempDir::new().unwrap();
    let mut settings = settings_for(temp_dir.path(), 200);
    settings.mutex.retry_backoff_ms = 50;
    settings.mutex.max_retry_backoff_ms = 100;

    invoke(&settings, lock("persona_1")).await.unwrap();

    let locked = invoke(
        &settings,
        Command::Lock {
            aggregate_id: "alliance_1".to_string(),
            owner_id: "persona_2".to_string(),
            retry: true,
        },
    )
    .await
    .unwrap();

    assert_eq!(locked["status"], "locked");
    assert!(locked["attempts"].as_u64().unwrap() > 1);
}

#[tokio::test]
async fn test_zero_lease_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let settings = settings_for(temp_dir.path(), 0);

    let err = invoke(&settings, lock("persona_1")).await.unwrap_err();
    assert_eq!(exit_code(&err), 1);
    assert!(err.to_string().contains("invalid expiry"));
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let temp_dir = TempDir::new().unwrap();
    let settings = settings_for(temp_dir.path(), 60_000);
    let cancel = CancelSignal::new();
    cancel.cancel();

    let mut out = Vec::new();
    let err = run(&settings, &lock("persona_1"), cancel, &mut out)
        .await
        .unwrap_err();

    assert_eq!(exit_code(&err), 5);
    assert!(out.is_empty());
}
