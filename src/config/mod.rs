//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! stack file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (interpolate ${VAR} from the environment)
//!     → validation.rs (semantic checks)
//!     → StackConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the stack is static per activation
//! - All fields have defaults; the built-in default stack is the deployment
//!   this tool replaces
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::Owner;
pub use schema::RestartPolicy;
pub use schema::RunSpec;
pub use schema::ServiceConfig;
pub use schema::StackConfig;
pub use schema::SubpathConfig;
pub use schema::SupervisorConfig;
pub use schema::VolumeConfig;
