//! Metrics collection and exposition.
//!
//! # Metrics
//! - `stackrun_unit_state` (gauge): current lifecycle state code per service
//! - `stackrun_unit_restarts_total` (counter): restarts per service
//!
//! # Design Decisions
//! - Recording is a no-op until the exporter is installed, so library users
//!   and tests pay nothing
//! - Labels carry the service name only; state names are encoded as the
//!   gauge value and documented above

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::supervisor::unit::UnitState;

/// Install the Prometheus exporter on the given address.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "failed to install metrics exporter"),
    }
}

/// Record a unit's lifecycle state transition.
pub fn record_unit_state(service: &str, state: UnitState) {
    gauge!("stackrun_unit_state", "service" => service.to_string()).set(state as u8 as f64);
}

/// Record one restart of a unit.
pub fn record_unit_restart(service: &str) {
    counter!("stackrun_unit_restarts_total", "service" => service.to_string()).increment(1);
}
