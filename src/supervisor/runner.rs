//! Single run attempts.
//!
//! # Responsibilities
//! - Execute one attempt of a unit: spawn its command, or run the built-in
//!   volume preparation on the blocking pool
//! - Map process exit into a uniform outcome
//! - Kill the process when shutdown is requested mid-run
//!
//! Each attempt carries a fresh run id so every log line of a given process
//! lifetime can be correlated.

use thiserror::Error;
use tokio::process::Command;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::config::schema::RunSpec;
use crate::supervisor::unit::Unit;
use crate::volume::layout::VolumeLayout;
use crate::volume::prepare;

/// How a single attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The process (or built-in task) finished.
    Exited {
        /// Whether the exit was successful.
        success: bool,
        /// Exit code, if the process exited normally.
        code: Option<i32>,
    },
    /// The attempt was interrupted by shutdown.
    Stopped,
}

/// Error starting an attempt.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to spawn \"{program}\": {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("volume preparation task was cancelled")]
    PrepareCancelled,
}

/// Run one attempt of the unit to completion.
pub async fn run_once(
    unit: &Unit,
    layout: &VolumeLayout,
    shutdown: &mut broadcast::Receiver<()>,
) -> Result<RunOutcome, RunnerError> {
    let run_id = Uuid::new_v4();
    unit.record_run(run_id);

    match &unit.config.run {
        RunSpec::PrepareVolume => run_prepare(unit, layout, run_id).await,
        RunSpec::Exec { command } => run_exec(unit, command, run_id, shutdown).await,
    }
}

async fn run_prepare(
    unit: &Unit,
    layout: &VolumeLayout,
    run_id: Uuid,
) -> Result<RunOutcome, RunnerError> {
    tracing::info!(
        service = %unit.name(),
        %run_id,
        root = %layout.root().display(),
        "preparing volume"
    );

    let layout = layout.clone();
    let result = tokio::task::spawn_blocking(move || prepare::prepare(&layout))
        .await
        .map_err(|_| RunnerError::PrepareCancelled)?;

    match result {
        Ok(()) => {
            tracing::info!(service = %unit.name(), %run_id, "volume prepared");
            Ok(RunOutcome::Exited {
                success: true,
                code: Some(0),
            })
        }
        Err(e) => {
            tracing::error!(service = %unit.name(), %run_id, error = %e, "volume preparation failed");
            Ok(RunOutcome::Exited {
                success: false,
                code: Some(1),
            })
        }
    }
}

async fn run_exec(
    unit: &Unit,
    command: &[String],
    run_id: Uuid,
    shutdown: &mut broadcast::Receiver<()>,
) -> Result<RunOutcome, RunnerError> {
    // Validation guarantees a non-empty command.
    let program = &command[0];

    tracing::info!(
        service = %unit.name(),
        %run_id,
        command = ?command,
        "starting process"
    );

    let mut child = Command::new(program)
        .args(&command[1..])
        .envs(&unit.config.env)
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| RunnerError::Spawn {
            program: program.clone(),
            source,
        })?;

    let waited = tokio::select! {
        status = child.wait() => Some(status),
        _ = shutdown.recv() => None,
    };

    match waited {
        Some(Ok(status)) => {
            let success = status.success();
            let code = status.code();
            if success {
                tracing::info!(service = %unit.name(), %run_id, "process exited successfully");
            } else {
                tracing::warn!(
                    service = %unit.name(),
                    %run_id,
                    code = ?code,
                    "process exited unsuccessfully"
                );
            }
            Ok(RunOutcome::Exited { success, code })
        }
        Some(Err(e)) => {
            tracing::error!(service = %unit.name(), %run_id, error = %e, "failed to wait on process");
            Ok(RunOutcome::Exited {
                success: false,
                code: None,
            })
        }
        None => {
            tracing::info!(service = %unit.name(), %run_id, "stopping process");
            let _ = child.start_kill();
            let _ = child.wait().await;
            Ok(RunOutcome::Stopped)
        }
    }
}
