//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT)
//! - Translate signals to a shutdown trigger
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - First signal triggers graceful shutdown; a second forces exit

use std::sync::Arc;

use tokio::signal::unix::{signal, SignalKind};

use crate::lifecycle::Shutdown;

/// Wait for SIGINT/SIGTERM and trigger shutdown. A second signal while
/// shutdown is in progress exits immediately.
pub async fn shutdown_on_signal(shutdown: Arc<Shutdown>) {
    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "failed to register SIGTERM handler");
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received SIGINT, shutting down");
        }
        _ = terminate.recv() => {
            tracing::info!("received SIGTERM, shutting down");
        }
    }
    shutdown.trigger();

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = terminate.recv() => {}
    }
    tracing::warn!("received second signal, exiting immediately");
    std::process::exit(130);
}
