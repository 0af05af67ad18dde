//! Configuration schema definitions.
//!
//! This module defines the complete stack definition for the supervisor.
//! All types derive Serde traits for deserialization from config files.
//!
//! The built-in `Default` stack mirrors the deployment this tool was written
//! for: a one-shot volume initializer, a TLS-terminating reverse proxy, and a
//! task synchronization backend, all sharing one volume root.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Root configuration for a service stack.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StackConfig {
    /// Stack identifier for logging and the status API.
    pub name: String,

    /// Shared persistent volume layout.
    pub volume: VolumeConfig,

    /// Service definitions.
    pub services: Vec<ServiceConfig>,

    /// Supervision settings (gate timeout, restart backoff).
    pub supervisor: SupervisorConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Status API settings.
    pub status: StatusConfig,
}

/// Shared volume configuration.
///
/// The volume is a single host directory subdivided into disjoint subpaths,
/// one logical region per concern. Ownership of a region can be fixed to a
/// numeric uid/gid so a service running as that user can write to it.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VolumeConfig {
    /// Host directory backing the volume.
    pub root: PathBuf,

    /// Logical regions inside the volume.
    pub subpaths: Vec<SubpathConfig>,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/var/lib/stackrun"),
            subpaths: vec![
                SubpathConfig::new(PROXY_DATA_SUBPATH),
                SubpathConfig::new(PROXY_CONFIG_SUBPATH),
                SubpathConfig::new(SYNC_DATA_SUBPATH).owned_by(SYNC_UID, SYNC_GID),
            ],
        }
    }
}

/// One logical region inside the shared volume.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubpathConfig {
    /// Relative path under the volume root (e.g. "sync-data").
    pub name: String,

    /// Optional fixed ownership applied recursively during preparation.
    #[serde(default)]
    pub owner: Option<Owner>,
}

impl SubpathConfig {
    /// A subpath with no ownership requirement.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            owner: None,
        }
    }

    /// Fix ownership of this subpath to the given numeric uid/gid.
    pub fn owned_by(mut self, uid: u32, gid: u32) -> Self {
        self.owner = Some(Owner { uid, gid });
        self
    }
}

/// Numeric ownership for a volume region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Owner {
    /// Numeric user id.
    pub uid: u32,
    /// Numeric group id.
    pub gid: u32,
}

/// A single service definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Unique service name.
    pub name: String,

    /// Informational image reference this unit corresponds to in the
    /// container deployment (pinned or floating tag). Carried through to the
    /// status API; the supervisor itself execs host binaries.
    #[serde(default)]
    pub image: Option<String>,

    /// What to run for this unit.
    pub run: RunSpec,

    /// Environment variables passed to the unit's process.
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Ports this service binds on the host. Informational plus a
    /// cross-service conflict check at validation time.
    #[serde(default)]
    pub ports: Vec<u16>,

    /// Restart policy applied when the unit's process exits.
    #[serde(default)]
    pub restart: RestartPolicy,

    /// Names of services that must complete successfully before this unit
    /// may start. This is the only ordering primitive in the model.
    #[serde(default)]
    pub depends_on: Vec<String>,
}

/// What a unit executes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunSpec {
    /// Create the volume subpaths and apply ownership, then exit. The native
    /// replacement for the shell one-liner the original initializer ran.
    PrepareVolume,

    /// Spawn an external command and supervise it.
    Exec {
        /// Program followed by its arguments.
        command: Vec<String>,
    },
}

impl RunSpec {
    /// Convenience constructor for exec units.
    pub fn exec<I, S>(command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Exec {
            command: command.into_iter().map(Into::into).collect(),
        }
    }
}

/// Restart policy vocabulary, matching the composition model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestartPolicy {
    /// Never restart. Required for one-shot units.
    #[default]
    No,
    /// Restart only when the process exits with a non-zero status.
    OnFailure,
    /// Restart on any exit.
    Always,
    /// Restart on any exit until the supervisor is asked to stop.
    UnlessStopped,
}

/// Supervision settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// How long a unit waits for its dependencies to complete before it is
    /// marked blocked, in seconds. Zero waits forever.
    pub gate_timeout_secs: u64,

    /// Base delay for restart backoff in milliseconds.
    pub restart_base_delay_ms: u64,

    /// Maximum delay for restart backoff in milliseconds.
    pub restart_max_delay_ms: u64,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            gate_timeout_secs: 300,
            restart_base_delay_ms: 500,
            restart_max_delay_ms: 30_000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Status API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Enable the status API.
    pub enabled: bool,

    /// Status API bind address. Loopback by default; the API carries no
    /// authentication.
    pub bind_address: String,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "127.0.0.1:7070".to_string(),
        }
    }
}

/// Subpath persisting the proxy's runtime state (certificates).
pub const PROXY_DATA_SUBPATH: &str = "proxy-data";
/// Subpath persisting the proxy's configuration.
pub const PROXY_CONFIG_SUBPATH: &str = "proxy-config";
/// Subpath persisting the sync backend's durable state.
pub const SYNC_DATA_SUBPATH: &str = "sync-data";

/// Numeric uid the sync backend runs as inside its image.
pub const SYNC_UID: u32 = 100;
/// Numeric gid the sync backend runs as inside its image.
pub const SYNC_GID: u32 = 100;

/// Internal address the proxy forwards decrypted traffic to.
pub const SYNC_INTERNAL_ADDR: &str = "localhost:8080";

/// Environment variable naming the public hostname the proxy serves.
pub const HOSTNAME_VAR: &str = "TASKCHAMPION_SYNC_SERVER_HOSTNAME";

impl Default for StackConfig {
    fn default() -> Self {
        let volume = VolumeConfig::default();
        let sync_data_dir = volume.root.join(SYNC_DATA_SUBPATH);
        let proxy_data_dir = volume.root.join(PROXY_DATA_SUBPATH);
        let proxy_config_dir = volume.root.join(PROXY_CONFIG_SUBPATH);

        let init = ServiceConfig {
            name: "init".to_string(),
            image: Some("caddy:2".to_string()),
            run: RunSpec::PrepareVolume,
            env: BTreeMap::new(),
            ports: Vec::new(),
            restart: RestartPolicy::No,
            depends_on: Vec::new(),
        };

        let proxy = ServiceConfig {
            name: "proxy".to_string(),
            image: Some("caddy:2".to_string()),
            run: RunSpec::exec(vec![
                "caddy".to_string(),
                "reverse-proxy".to_string(),
                "--from".to_string(),
                format!("${{{}}}", HOSTNAME_VAR),
                "--to".to_string(),
                SYNC_INTERNAL_ADDR.to_string(),
            ]),
            env: BTreeMap::from([
                // The proxy persists certificates and config under XDG dirs.
                (
                    "XDG_DATA_HOME".to_string(),
                    proxy_data_dir.display().to_string(),
                ),
                (
                    "XDG_CONFIG_HOME".to_string(),
                    proxy_config_dir.display().to_string(),
                ),
            ]),
            ports: vec![80, 443],
            restart: RestartPolicy::UnlessStopped,
            depends_on: vec!["init".to_string()],
        };

        let sync = ServiceConfig {
            name: "sync".to_string(),
            image: Some(
                "ghcr.io/gothenburgbitfactory/taskchampion-sync-server:0.6.1".to_string(),
            ),
            run: RunSpec::exec(["taskchampion-sync-server"]),
            env: BTreeMap::from([
                ("RUST_LOG".to_string(), "info".to_string()),
                ("DATA_DIR".to_string(), sync_data_dir.display().to_string()),
                ("LISTEN".to_string(), "0.0.0.0:8080".to_string()),
            ]),
            ports: Vec::new(),
            restart: RestartPolicy::UnlessStopped,
            depends_on: vec!["init".to_string()],
        };

        Self {
            name: "taskchampion-sync".to_string(),
            volume,
            services: vec![init, proxy, sync],
            supervisor: SupervisorConfig::default(),
            observability: ObservabilityConfig::default(),
            status: StatusConfig::default(),
        }
    }
}

impl StackConfig {
    /// Look up a service definition by name.
    pub fn service(&self, name: &str) -> Option<&ServiceConfig> {
        self.services.iter().find(|s| s.name == name)
    }
}
