//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (unit state gauge, restart counter)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Run ID flows through every process attempt's log lines
//! - Metrics are cheap (atomic updates behind the recorder)
//! - The exporter is optional; recording without it is a no-op

pub mod logging;
pub mod metrics;
