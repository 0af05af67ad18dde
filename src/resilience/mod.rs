//! Resilience subsystem.
//!
//! # Design Decisions
//! - Crash recovery is restart-based, driven by per-service policy
//! - Delays between restarts grow exponentially with jitter so a
//!   crash-looping unit cannot busy-spin the supervisor
//! - A sufficiently long run resets the backoff

pub mod backoff;

pub use backoff::RestartBackoff;
