//! Shared volume subsystem.
//!
//! # Data Flow
//! ```text
//! VolumeConfig (root + subpaths)
//!     → layout.rs (resolve subpath names to host paths)
//!     → prepare.rs (create directories, apply ownership)
//!     → services read/write their own region only
//! ```
//!
//! # Design Decisions
//! - Each service is scoped to a disjoint subpath; disjointness is checked
//!   at validation time, not trusted to the operator
//! - Preparation is idempotent: re-running against an initialized volume
//!   succeeds
//! - Ownership is numeric uid/gid, applied recursively, so a service
//!   running as that user can write without name resolution on the host

pub mod layout;
pub mod prepare;

pub use layout::VolumeLayout;
pub use prepare::{prepare, PrepareError};
