//! stackrun: a minimal declarative service-stack supervisor.
//!
//! Runs a small stack of services described by one TOML file: a shared
//! volume prepared by a one-shot initializer, long-running services gated on
//! its successful completion, restart policies applied on exit.
//!
//! # Architecture Overview
//!
//! ```text
//!              ┌──────────────────────────────────────────────────────┐
//!              │                     SUPERVISOR                        │
//!              │                                                       │
//!   stack.toml │  ┌─────────┐    ┌──────────┐    ┌─────────────────┐  │
//!   ───────────┼─▶│ config  │───▶│  volume  │───▶│   supervisor    │  │
//!              │  │ loader  │    │  layout  │    │ gate → run →    │  │
//!              │  └─────────┘    └──────────┘    │ restart policy  │  │
//!              │                                 └────────┬────────┘  │
//!              │                                          │           │
//!              │                                          ▼           │
//!              │                                 ┌─────────────────┐  │
//!              │                                 │ child processes │  │
//!              │                                 │ + prepare task  │  │
//!              │                                 └─────────────────┘  │
//!              │                                                       │
//!              │  ┌────────────────────────────────────────────────┐  │
//!              │  │              Cross-Cutting Concerns             │  │
//!              │  │  ┌─────────┐ ┌───────────┐ ┌────────────────┐  │  │
//!              │  │  │ status  │ │ lifecycle │ │ observability  │  │  │
//!              │  │  │  API    │ │ sig/stop  │ │ logs + metrics │  │  │
//!              │  │  └─────────┘ └───────────┘ └────────────────┘  │  │
//!              │  └────────────────────────────────────────────────┘  │
//!              └──────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod status;
pub mod supervisor;
pub mod volume;

pub use config::schema::StackConfig;
pub use lifecycle::Shutdown;
pub use supervisor::Supervisor;
