//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Metrics → Status API → Supervisor
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop-requested flag set → Units stop → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then observability, supervisor last
//! - The stop-requested flag distinguishes "process exited" from "operator
//!   asked us to stop", which the restart policies depend on
//! - Shutdown is broadcast; every long-running task holds a receiver

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
