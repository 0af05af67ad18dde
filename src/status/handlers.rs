use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::supervisor::unit::UnitState;
use crate::supervisor::{Unit, UnitRegistry};

/// Shared state injected into status handlers.
#[derive(Clone)]
pub struct StatusState {
    stack: String,
    registry: Arc<UnitRegistry>,
    started_at: Instant,
}

impl StatusState {
    /// Create handler state over a unit registry.
    pub fn new(stack: String, registry: Arc<UnitRegistry>) -> Self {
        Self {
            stack,
            registry,
            started_at: Instant::now(),
        }
    }
}

#[derive(Serialize)]
pub struct StackStatus {
    pub version: &'static str,
    pub stack: String,
    pub uptime_secs: u64,
    pub units: BTreeMap<&'static str, usize>,
}

#[derive(Serialize)]
pub struct ServiceStatus {
    pub name: String,
    pub image: Option<String>,
    pub state: UnitState,
    pub restarts: u64,
    pub exit_code: Option<i32>,
    pub run_id: Option<Uuid>,
}

impl ServiceStatus {
    fn from_unit(unit: &Unit) -> Self {
        let details = unit.details();
        Self {
            name: unit.name().to_string(),
            image: unit.config.image.clone(),
            state: unit.state(),
            restarts: unit.restarts(),
            exit_code: details.exit_code,
            run_id: details.run_id,
        }
    }
}

pub async fn get_stack(State(state): State<StatusState>) -> Json<StackStatus> {
    Json(StackStatus {
        version: env!("CARGO_PKG_VERSION"),
        stack: state.stack.clone(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        units: state.registry.state_counts(),
    })
}

pub async fn get_services(State(state): State<StatusState>) -> Json<Vec<ServiceStatus>> {
    let statuses = state
        .registry
        .all()
        .iter()
        .map(|unit| ServiceStatus::from_unit(unit))
        .collect();
    Json(statuses)
}

pub async fn get_service(
    State(state): State<StatusState>,
    Path(name): Path<String>,
) -> Result<Json<ServiceStatus>, StatusCode> {
    state
        .registry
        .get(&name)
        .map(|unit| Json(ServiceStatus::from_unit(&unit)))
        .ok_or(StatusCode::NOT_FOUND)
}
