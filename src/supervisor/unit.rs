//! Unit abstraction.
//!
//! # Responsibilities
//! - Represent a single supervised service at runtime
//! - Track lifecycle state (atomic, readable from the status API)
//! - Track restart count and last run details
//! - Publish completion for the dependency gate

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Mutex;

use serde::Serialize;
use tokio::sync::watch;
use uuid::Uuid;

use crate::config::schema::{RestartPolicy, ServiceConfig};
use crate::observability::metrics;

/// Lifecycle state of a unit.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitState {
    /// Defined but not yet picked up by the supervisor.
    Pending = 0,
    /// Waiting for dependencies to complete.
    Waiting = 1,
    /// Process (or built-in task) is running.
    Running = 2,
    /// Exited; waiting out the backoff delay before the next attempt.
    Restarting = 3,
    /// One-shot work finished successfully.
    Completed = 4,
    /// Exited unsuccessfully with no further restarts.
    Failed = 5,
    /// Never started: a dependency failed or the gate timed out.
    Blocked = 6,
    /// Terminated because the supervisor was asked to stop.
    Stopped = 7,
}

impl From<u8> for UnitState {
    fn from(val: u8) -> Self {
        match val {
            1 => UnitState::Waiting,
            2 => UnitState::Running,
            3 => UnitState::Restarting,
            4 => UnitState::Completed,
            5 => UnitState::Failed,
            6 => UnitState::Blocked,
            7 => UnitState::Stopped,
            _ => UnitState::Pending,
        }
    }
}

impl UnitState {
    /// Stable lowercase name, used in logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitState::Pending => "pending",
            UnitState::Waiting => "waiting",
            UnitState::Running => "running",
            UnitState::Restarting => "restarting",
            UnitState::Completed => "completed",
            UnitState::Failed => "failed",
            UnitState::Blocked => "blocked",
            UnitState::Stopped => "stopped",
        }
    }
}

/// Completion signal published to dependents through the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionState {
    /// Not finished yet.
    Pending,
    /// Exited successfully; dependents may start.
    Succeeded,
    /// Exited unsuccessfully, was blocked, or was stopped; dependents must
    /// not start.
    Failed,
}

/// Details of the most recent run attempt.
#[derive(Debug, Clone, Default)]
pub struct RunDetails {
    /// Exit code of the last finished attempt, if the process exited.
    pub exit_code: Option<i32>,
    /// Identifier of the last attempt, correlating log lines.
    pub run_id: Option<Uuid>,
}

/// A single supervised service.
#[derive(Debug)]
pub struct Unit {
    /// The service definition this unit runs.
    pub config: ServiceConfig,

    /// Current lifecycle state.
    state: AtomicU8,
    /// Number of restarts performed so far.
    restarts: AtomicU64,
    /// Last run details.
    details: Mutex<RunDetails>,

    /// Completion publisher for the dependency gate.
    completion: watch::Sender<CompletionState>,
}

impl Unit {
    /// Create a new unit in the `Pending` state.
    pub fn new(config: ServiceConfig) -> Self {
        let (completion, _) = watch::channel(CompletionState::Pending);
        Self {
            config,
            state: AtomicU8::new(UnitState::Pending as u8),
            restarts: AtomicU64::new(0),
            details: Mutex::new(RunDetails::default()),
            completion,
        }
    }

    /// The unit's service name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// The unit's restart policy.
    pub fn restart_policy(&self) -> RestartPolicy {
        self.config.restart
    }

    /// Current lifecycle state.
    pub fn state(&self) -> UnitState {
        self.state.load(Ordering::Relaxed).into()
    }

    /// Transition to a new state, logging and recording the gauge.
    pub fn set_state(&self, state: UnitState) {
        let prev: UnitState = self.state.swap(state as u8, Ordering::Relaxed).into();
        if prev != state {
            tracing::debug!(
                service = %self.name(),
                from = prev.as_str(),
                to = state.as_str(),
                "unit state changed"
            );
            metrics::record_unit_state(self.name(), state);
        }
    }

    /// Number of restarts performed so far.
    pub fn restarts(&self) -> u64 {
        self.restarts.load(Ordering::Relaxed)
    }

    /// Count one restart.
    pub fn record_restart(&self) -> u64 {
        metrics::record_unit_restart(self.name());
        self.restarts.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Record the start of a run attempt.
    pub fn record_run(&self, run_id: Uuid) {
        let mut details = self.details.lock().expect("poisoned lock");
        details.run_id = Some(run_id);
        details.exit_code = None;
    }

    /// Record the exit code of a finished attempt.
    pub fn record_exit(&self, exit_code: Option<i32>) {
        self.details.lock().expect("poisoned lock").exit_code = exit_code;
    }

    /// Snapshot of the last run details.
    pub fn details(&self) -> RunDetails {
        self.details.lock().expect("poisoned lock").clone()
    }

    /// Subscribe to this unit's completion for gating.
    pub fn subscribe_completion(&self) -> watch::Receiver<CompletionState> {
        self.completion.subscribe()
    }

    /// Publish a terminal completion state. Later publications are ignored
    /// so the first terminal outcome wins.
    pub fn publish_completion(&self, state: CompletionState) {
        self.completion.send_if_modified(|current| {
            if *current == CompletionState::Pending && state != CompletionState::Pending {
                *current = state;
                true
            } else {
                false
            }
        });
    }
}

/// Decide whether a unit's process should be started again after an exit.
pub fn should_restart(policy: RestartPolicy, exit_success: bool, stop_requested: bool) -> bool {
    match policy {
        RestartPolicy::No => false,
        RestartPolicy::OnFailure => !exit_success && !stop_requested,
        RestartPolicy::Always | RestartPolicy::UnlessStopped => !stop_requested,
    }
}
