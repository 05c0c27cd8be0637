//! Entry point for the `leasehold` binary.

use std::process::ExitCode;

use clap::Parser;
use leasehold_cli::{Cli, Settings, exit_code, report_failure, run, startup};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::load(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let _logging_guard = match startup::init_logging(&settings.logging.to_logging_config()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let cancel = startup::cancel_on_shutdown();
    let mut stdout = std::io::stdout().lock();

    match run(&settings, &cli.command, cancel, &mut stdout).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_failure(
                &cli.command,
                &e,
                settings.logging.console,
                &mut std::io::stderr(),
            );
            ExitCode::from(exit_code(&e))
        }
    }
}
