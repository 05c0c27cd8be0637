//! Process startup: logging and signal handling

pub mod logging;
pub mod shutdown;

pub use logging::{LogRotation, LoggingConfig, LoggingGuard, init_logging};
pub use shutdown::{cancel_on_shutdown, shutdown_requested};
