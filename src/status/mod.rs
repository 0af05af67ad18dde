//! Status API subsystem.
//!
//! A small loopback HTTP surface exposing the live state of every unit, for
//! operators and the control CLI. Read-only; it carries no authentication
//! and should stay bound to loopback.

pub mod handlers;

use std::net::SocketAddr;

use axum::{routing::get, Router};
use tokio::sync::broadcast;

use self::handlers::{get_service, get_services, get_stack};
pub use self::handlers::StatusState;

/// Build the status router.
pub fn router(state: StatusState) -> Router {
    Router::new()
        .route("/stack", get(get_stack))
        .route("/services", get(get_services))
        .route("/services/{name}", get(get_service))
        .with_state(state)
}

/// Serve the status API until shutdown.
pub async fn serve(addr: SocketAddr, state: StatusState, mut shutdown: broadcast::Receiver<()>) {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "failed to bind status API");
            return;
        }
    };

    tracing::info!(address = %addr, "status API listening");

    let server = axum::serve(listener, router(state)).with_graceful_shutdown(async move {
        let _ = shutdown.recv().await;
    });

    if let Err(e) = server.await {
        tracing::error!(error = %e, "status API server error");
    }
}
