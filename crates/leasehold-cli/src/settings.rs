//! Settings for the leasehold host
//!
//! Sources are layered lowest to highest precedence:
//! 1. `conf/leasehold.yml` (or the file given with `--config`)
//! 2. `LEASEHOLD_`-prefixed environment variables, `__` between sections
//!    (e.g. `LEASEHOLD_MUTEX__LEASE_DURATION_MS=5000`)
//! 3. command line flags

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use config::{Config, ConfigBuilder, Environment, File, builder::DefaultState};
use leasehold_mutex::MutexConfig;
use serde::Deserialize;

use crate::command::Command;
use crate::startup::{LogRotation, LoggingConfig};

pub const DEFAULT_CONFIG_FILE: &str = "conf/leasehold";
pub const ENV_PREFIX: &str = "LEASEHOLD";

/// Command line arguments
#[derive(Debug, Parser)]
#[command(name = "leasehold", version, about = "Lease-based distributed mutex")]
pub struct Cli {
    /// Settings file (default: conf/leasehold.yml when present)
    #[arg(short = 'c', long = "config", env = "LEASEHOLD_CONFIG_FILE")]
    pub config: Option<PathBuf>,
    /// Directory of the embedded lock store
    #[arg(short = 'd', long = "data-dir")]
    pub data_dir: Option<PathBuf>,
    /// Lock table name
    #[arg(short = 't', long = "table")]
    pub table: Option<String>,
    /// Lease duration in milliseconds
    #[arg(long = "lease-ms")]
    pub lease_ms: Option<u64>,
    /// Per-request timeout in milliseconds
    #[arg(long = "timeout-ms")]
    pub timeout_ms: Option<u64>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// RocksDB directory (default: data/leasehold)
    pub data_dir: PathBuf,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/leasehold"),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct RequestSettings {
    /// Deadline applied to every operation; unset means no deadline
    pub timeout_ms: Option<u64>,
}

impl RequestSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub console: bool,
    pub file: bool,
    /// Log directory, `~/leasehold/logs` when unset
    pub dir: Option<String>,
    /// `daily`, `hourly` or `never`
    pub rotation: LogRotation,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console: true,
            file: false,
            dir: None,
            rotation: LogRotation::Daily,
        }
    }
}

impl LoggingSettings {
    pub fn to_logging_config(&self) -> LoggingConfig {
        LoggingConfig::from_config(
            self.dir.clone(),
            self.console,
            self.file,
            &self.level,
            self.rotation,
        )
    }
}

/// Fully resolved host settings
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub mutex: MutexConfig,
    pub store: StoreSettings,
    pub request: RequestSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Load settings for a parsed command line
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let builder = Config::builder()
            .add_source(file_source(cli.config.as_deref()))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );
        Self::build(apply_overrides(builder, cli)?)
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<Self> {
        let settings: Settings = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;
        settings
            .mutex
            .validate()
            .context("Invalid mutex configuration")?;
        Ok(settings)
    }
}

fn file_source(path: Option<&Path>) -> File<config::FileSourceFile, config::FileFormat> {
    match path {
        // An explicitly named file has to exist
        Some(path) => File::from(path).required(true),
        None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
    }
}

fn apply_overrides(
    mut builder: ConfigBuilder<DefaultState>,
    cli: &Cli,
) -> anyhow::Result<ConfigBuilder<DefaultState>> {
    if let Some(dir) = &cli.data_dir {
        builder = builder.set_override("store.data_dir", dir.to_string_lossy().to_string())?;
    }
    if let Some(table) = &cli.table {
        builder = builder.set_override("mutex.table", table.as_str())?;
    }
    if let Some(ms) = cli.lease_ms {
        let ms = i64::try_from(ms).context("--lease-ms out of range")?;
        builder = builder.set_override("mutex.lease_duration_ms", ms)?;
    }
    if let Some(ms) = cli.timeout_ms {
        let ms = i64::try_from(ms).context("--timeout-ms out of range")?;
        builder = builder.set_override("request.timeout_ms", ms)?;
    }
    Ok(builder)
}
