//! Shared utilities for integration testing the supervisor.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use stackrun::config::schema::{RestartPolicy, RunSpec, ServiceConfig, StackConfig};
use stackrun::lifecycle::Shutdown;
use stackrun::supervisor::{Supervisor, SupervisorError, UnitRegistry, UnitState};

/// A one-shot service running a shell script.
#[allow(dead_code)]
pub fn shell(name: &str, script: &str) -> ServiceConfig {
    ServiceConfig {
        name: name.to_string(),
        image: None,
        run: RunSpec::exec(["sh", "-c", script]),
        env: BTreeMap::new(),
        ports: Vec::new(),
        restart: RestartPolicy::No,
        depends_on: Vec::new(),
    }
}

/// A stack definition suitable for tests: no volume subpaths, short restart
/// backoff, status API disabled.
#[allow(dead_code)]
pub fn stack(services: Vec<ServiceConfig>) -> StackConfig {
    let mut config = StackConfig {
        services,
        ..StackConfig::default()
    };
    config.volume.subpaths.clear();
    config.supervisor.restart_base_delay_ms = 10;
    config.supervisor.restart_max_delay_ms = 50;
    config.status.enabled = false;
    config.observability.metrics_enabled = false;
    config
}

/// A running supervisor plus handles to observe and stop it.
pub struct Harness {
    pub registry: Arc<UnitRegistry>,
    pub shutdown: Arc<Shutdown>,
    pub handle: JoinHandle<Result<(), SupervisorError>>,
}

/// Start a supervisor over the given stack in the background.
#[allow(dead_code)]
pub fn start(config: StackConfig) -> Harness {
    let shutdown = Arc::new(Shutdown::new());
    let supervisor = Supervisor::new(&config, shutdown.clone());
    let registry = supervisor.registry();
    let handle = tokio::spawn(async move { supervisor.run().await });
    Harness {
        registry,
        shutdown,
        handle,
    }
}

/// Poll until the named unit reaches the wanted state. Returns false on
/// timeout.
#[allow(dead_code)]
pub async fn wait_for_state(
    registry: &UnitRegistry,
    name: &str,
    wanted: UnitState,
    timeout: Duration,
) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let unit = registry.get(name).expect("unknown unit");
        if unit.state() == wanted {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
