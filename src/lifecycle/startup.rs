//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order
//! - Start background tasks (status API, metrics exporter)
//! - Run the supervisor until the stack settles or shutdown
//!
//! # Design Decisions
//! - Fail fast: config problems are fatal before anything starts
//! - Observability first, supervisor last

use std::sync::Arc;

use crate::config::schema::StackConfig;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::status::{self, StatusState};
use crate::supervisor::{Supervisor, SupervisorError};

/// Bring up the stack and run it to rest.
///
/// Expects a validated config (the loader validates). Returns the
/// supervisor's verdict: an error lists units that ended failed or blocked.
pub async fn run_stack(
    config: &StackConfig,
    shutdown: Arc<Shutdown>,
) -> Result<(), SupervisorError> {
    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "failed to parse metrics address"
            );
        }
    }

    let supervisor = Supervisor::new(config, shutdown.clone());
    let registry = supervisor.registry();

    let status_task = if config.status.enabled {
        match config.status.bind_address.parse() {
            Ok(addr) => {
                let state = StatusState::new(config.name.clone(), registry);
                let rx = shutdown.subscribe();
                Some(tokio::spawn(status::serve(addr, state, rx)))
            }
            Err(_) => {
                tracing::error!(
                    bind_address = %config.status.bind_address,
                    "failed to parse status bind address"
                );
                None
            }
        }
    } else {
        None
    };

    let result = supervisor.run().await;

    // The stack has settled; release the status server as well.
    shutdown.trigger();
    if let Some(task) = status_task {
        let _ = task.await;
    }

    result
}
