//! Signal handling
//!
//! Ctrl+C or SIGTERM cancels the in-flight operation through its
//! [`CancelSignal`], so a pending store call is abandoned instead of the
//! process being killed mid-request.

use leasehold_mutex::CancelSignal;
use tracing::{info, warn};

/// Resolves on the first Ctrl+C or SIGTERM
pub async fn shutdown_requested() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, cancelling request"),
        _ = terminate => info!("Received SIGTERM, cancelling request"),
    }
}

/// Cancel signal that fires when the process is asked to stop
pub fn cancel_on_shutdown() -> CancelSignal {
    let cancel = CancelSignal::new();
    let trigger = cancel.clone();

    tokio::spawn(async move {
        shutdown_requested().await;
        trigger.cancel();
    });

    cancel
}
