//! Process supervision subsystem.
//!
//! # Data Flow
//! ```text
//! StackConfig
//!     → UnitRegistry (one Unit per service)
//!     → one supervision task per unit:
//!         wait on completion gate (gate.rs)
//!         → run attempt (runner.rs)
//!         → restart decision (unit.rs policy table)
//!         → backoff between restarts (resilience)
//!     → terminal states observable via the registry / status API
//! ```
//!
//! # Design Decisions
//! - Gating is the only cross-unit coordination; everything else is
//!   per-unit and independent
//! - A one-shot unit publishes its completion exactly once; the first
//!   terminal outcome wins
//! - Shutdown interrupts gates, runs, and backoff sleeps alike

pub mod gate;
pub mod runner;
pub mod unit;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use thiserror::Error;
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::config::schema::{StackConfig, SupervisorConfig};
use crate::lifecycle::Shutdown;
use crate::resilience::RestartBackoff;
use crate::supervisor::gate::GateOutcome;
use crate::supervisor::runner::RunOutcome;
use crate::supervisor::unit::{should_restart, CompletionState};
use crate::volume::layout::VolumeLayout;

pub use unit::{RunDetails, Unit, UnitState};

/// A run at least this long counts as healthy and resets restart backoff.
const BACKOFF_RESET_AFTER: Duration = Duration::from_secs(10);

/// Shared, concurrently readable collection of units.
#[derive(Debug, Default)]
pub struct UnitRegistry {
    units: DashMap<String, Arc<Unit>>,
}

impl UnitRegistry {
    fn from_config(config: &StackConfig) -> Self {
        let units = DashMap::new();
        for service in &config.services {
            units.insert(
                service.name.clone(),
                Arc::new(Unit::new(service.clone())),
            );
        }
        Self { units }
    }

    /// Look up a unit by service name.
    pub fn get(&self, name: &str) -> Option<Arc<Unit>> {
        self.units.get(name).map(|u| Arc::clone(u.value()))
    }

    /// All units, sorted by name for stable output.
    pub fn all(&self) -> Vec<Arc<Unit>> {
        let mut units: Vec<Arc<Unit>> =
            self.units.iter().map(|u| Arc::clone(u.value())).collect();
        units.sort_by(|a, b| a.name().cmp(b.name()));
        units
    }

    /// Count of units per lifecycle state.
    pub fn state_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for unit in self.units.iter() {
            *counts.entry(unit.state().as_str()).or_insert(0) += 1;
        }
        counts
    }
}

/// Error type for a finished supervision run.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("units ended unsuccessfully: {}", .0.join(", "))]
    UnitsFailed(Vec<String>),
}

/// Supervises every unit of a stack until all settle or shutdown.
pub struct Supervisor {
    layout: VolumeLayout,
    settings: SupervisorConfig,
    registry: Arc<UnitRegistry>,
    shutdown: Arc<Shutdown>,
}

impl Supervisor {
    /// Build a supervisor for a validated stack definition.
    pub fn new(config: &StackConfig, shutdown: Arc<Shutdown>) -> Self {
        Self {
            layout: VolumeLayout::new(&config.volume),
            settings: config.supervisor.clone(),
            registry: Arc::new(UnitRegistry::from_config(config)),
            shutdown,
        }
    }

    /// The unit registry, for the status API.
    pub fn registry(&self) -> Arc<UnitRegistry> {
        self.registry.clone()
    }

    /// Run the whole stack. Returns once every unit has reached a terminal
    /// state (one-shots settle on their own; long-running units settle on
    /// shutdown). Reports units that ended failed or blocked.
    pub async fn run(&self) -> Result<(), SupervisorError> {
        let mut tasks = JoinSet::new();

        for unit in self.registry.all() {
            // Subscribe before any task runs so no completion is missed.
            let deps: Vec<_> = unit
                .config
                .depends_on
                .iter()
                .filter_map(|dep| {
                    self.registry
                        .get(dep)
                        .map(|u| (dep.clone(), u.subscribe_completion()))
                })
                .collect();

            tasks.spawn(supervise_unit(
                unit,
                deps,
                self.layout.clone(),
                self.settings.clone(),
                self.shutdown.clone(),
            ));
        }

        while tasks.join_next().await.is_some() {}

        let failed: Vec<String> = self
            .registry
            .all()
            .iter()
            .filter(|u| matches!(u.state(), UnitState::Failed | UnitState::Blocked))
            .map(|u| u.name().to_string())
            .collect();

        if failed.is_empty() {
            Ok(())
        } else {
            Err(SupervisorError::UnitsFailed(failed))
        }
    }
}

/// Drive one unit through gate, runs, and restarts until terminal.
async fn supervise_unit(
    unit: Arc<Unit>,
    deps: Vec<(String, tokio::sync::watch::Receiver<CompletionState>)>,
    layout: VolumeLayout,
    settings: SupervisorConfig,
    shutdown: Arc<Shutdown>,
) {
    let mut shutdown_rx = shutdown.subscribe();

    unit.set_state(UnitState::Waiting);

    let gate_timeout = match settings.gate_timeout_secs {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };

    if !deps.is_empty() {
        let outcome = tokio::select! {
            outcome = gate::wait_for_dependencies(deps, gate_timeout) => outcome,
            _ = shutdown_rx.recv() => {
                unit.set_state(UnitState::Stopped);
                unit.publish_completion(CompletionState::Failed);
                return;
            }
        };

        match outcome {
            GateOutcome::Ready => {}
            GateOutcome::DependencyFailed(dep) => {
                tracing::warn!(
                    service = %unit.name(),
                    dependency = %dep,
                    "dependency did not complete successfully, unit will not start"
                );
                unit.set_state(UnitState::Blocked);
                unit.publish_completion(CompletionState::Failed);
                return;
            }
            GateOutcome::TimedOut(dep) => {
                tracing::warn!(
                    service = %unit.name(),
                    dependency = %dep,
                    timeout_secs = settings.gate_timeout_secs,
                    "timed out waiting for dependency, unit will not start"
                );
                unit.set_state(UnitState::Blocked);
                unit.publish_completion(CompletionState::Failed);
                return;
            }
        }
    }

    let mut backoff = RestartBackoff::new(
        settings.restart_base_delay_ms,
        settings.restart_max_delay_ms,
    );

    loop {
        unit.set_state(UnitState::Running);
        let started = Instant::now();

        let (success, code) =
            match runner::run_once(&unit, &layout, &mut shutdown_rx).await {
                Ok(RunOutcome::Stopped) => {
                    unit.set_state(UnitState::Stopped);
                    unit.publish_completion(CompletionState::Failed);
                    return;
                }
                Ok(RunOutcome::Exited { success, code }) => (success, code),
                Err(e) => {
                    tracing::error!(service = %unit.name(), error = %e, "run attempt failed to start");
                    (false, None)
                }
            };

        unit.record_exit(code);

        let stop = shutdown.is_stop_requested();
        if !should_restart(unit.restart_policy(), success, stop) {
            // A restart suppressed only by the stop request means the unit
            // was stopped, not that it settled on its own.
            if stop && should_restart(unit.restart_policy(), success, false) {
                unit.set_state(UnitState::Stopped);
                unit.publish_completion(CompletionState::Failed);
            } else if success {
                unit.set_state(UnitState::Completed);
                unit.publish_completion(CompletionState::Succeeded);
            } else {
                unit.set_state(UnitState::Failed);
                unit.publish_completion(CompletionState::Failed);
            }
            return;
        }

        if started.elapsed() >= BACKOFF_RESET_AFTER {
            backoff.reset();
        }

        let restarts = unit.record_restart();
        let delay = backoff.next_delay();
        tracing::info!(
            service = %unit.name(),
            restarts,
            delay_ms = delay.as_millis() as u64,
            "restarting unit"
        );
        unit.set_state(UnitState::Restarting);

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown_rx.recv() => {
                unit.set_state(UnitState::Stopped);
                unit.publish_completion(CompletionState::Failed);
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{RestartPolicy, RunSpec, ServiceConfig, StackConfig};
    use std::collections::BTreeMap;

    fn service(name: &str, command: &[&str], deps: &[&str]) -> ServiceConfig {
        ServiceConfig {
            name: name.to_string(),
            image: None,
            run: RunSpec::exec(command.iter().copied()),
            env: BTreeMap::new(),
            ports: Vec::new(),
            restart: RestartPolicy::No,
            depends_on: deps.iter().map(|d| d.to_string()).collect(),
        }
    }

    fn stack(services: Vec<ServiceConfig>) -> StackConfig {
        let mut config = StackConfig {
            services,
            ..StackConfig::default()
        };
        config.volume.subpaths.clear();
        config.supervisor.restart_base_delay_ms = 10;
        config.supervisor.restart_max_delay_ms = 50;
        config
    }

    #[tokio::test]
    async fn one_shot_chain_completes_in_order() {
        let config = stack(vec![
            service("first", &["true"], &[]),
            service("second", &["true"], &["first"]),
        ]);
        let shutdown = Arc::new(Shutdown::new());
        let supervisor = Supervisor::new(&config, shutdown);
        let registry = supervisor.registry();

        supervisor.run().await.unwrap();

        assert_eq!(registry.get("first").unwrap().state(), UnitState::Completed);
        assert_eq!(registry.get("second").unwrap().state(), UnitState::Completed);
    }

    #[tokio::test]
    async fn failed_dependency_blocks_dependents() {
        let config = stack(vec![
            service("first", &["sh", "-c", "exit 1"], &[]),
            service("second", &["true"], &["first"]),
            service("third", &["true"], &["second"]),
        ]);
        let shutdown = Arc::new(Shutdown::new());
        let supervisor = Supervisor::new(&config, shutdown);
        let registry = supervisor.registry();

        let err = supervisor.run().await.unwrap_err();
        let SupervisorError::UnitsFailed(failed) = err;

        assert_eq!(registry.get("first").unwrap().state(), UnitState::Failed);
        assert_eq!(registry.get("second").unwrap().state(), UnitState::Blocked);
        assert_eq!(registry.get("third").unwrap().state(), UnitState::Blocked);
        assert_eq!(failed.len(), 3);
    }

    #[tokio::test]
    async fn state_counts_reflect_terminal_states() {
        let config = stack(vec![
            service("a", &["true"], &[]),
            service("b", &["sh", "-c", "exit 1"], &[]),
        ]);
        let shutdown = Arc::new(Shutdown::new());
        let supervisor = Supervisor::new(&config, shutdown);
        let registry = supervisor.registry();

        let _ = supervisor.run().await;

        let counts = registry.state_counts();
        assert_eq!(counts.get("completed"), Some(&1));
        assert_eq!(counts.get("failed"), Some(&1));
    }
}
