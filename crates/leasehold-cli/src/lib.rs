//! Command line host for the leasehold mutex.
//!
//! Loads [`Settings`](settings::Settings), installs logging, opens the
//! embedded lock store and runs one `lock`, `unlock` or `get` command.

pub mod command;
pub mod settings;
pub mod startup;

pub use command::{Command, execute, exit_code, report_failure, run};
pub use settings::{Cli, Settings};
