// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signal handling for long runs.
//!
//! SIGTERM or SIGINT (Ctrl+C) cancels the run token. The pipeline then stops
//! reading sources and still builds a catalog from what it already has.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Returns a token that is cancelled when SIGINT or SIGTERM arrives.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => info!("received SIGINT (Ctrl+C), stopping run"),
                        _ = sigterm.recv() => info!("received SIGTERM, stopping run"),
                    }
                }
                Err(e) => {
                    warn!(error = %e, "SIGTERM handler unavailable, listening for Ctrl+C only");
                    let _ = ctrl_c.await;
                    info!("received SIGINT (Ctrl+C), stopping run");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, stopping run");
        }

        token_clone.cancel();
        debug!("signal handler completed");
    });

    token
}
