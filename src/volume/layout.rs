//! Volume layout resolution.
//!
//! Maps logical subpath names from the stack definition to absolute host
//! paths under the volume root.

use std::path::{Component, Path, PathBuf};

use crate::config::schema::{SubpathConfig, VolumeConfig};

/// Resolved view of the shared volume.
#[derive(Debug, Clone)]
pub struct VolumeLayout {
    root: PathBuf,
    subpaths: Vec<SubpathConfig>,
}

impl VolumeLayout {
    /// Build a layout from the volume section of the stack definition.
    pub fn new(config: &VolumeConfig) -> Self {
        Self {
            root: config.root.clone(),
            subpaths: config.subpaths.clone(),
        }
    }

    /// The host directory backing the volume.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The configured subpaths.
    pub fn subpaths(&self) -> &[SubpathConfig] {
        &self.subpaths
    }

    /// Resolve a subpath name to its host path. Returns `None` for names not
    /// present in the layout.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        self.subpaths
            .iter()
            .find(|s| s.name == name)
            .map(|s| self.root.join(&s.name))
    }
}

/// A subpath name must be a relative path that stays inside the volume:
/// non-empty, no root or parent components.
pub fn valid_subpath_name(name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    Path::new(name)
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
}

/// Two subpaths overlap when one is a path prefix of the other (or they are
/// equal), which would give two services access to the same region.
pub fn subpaths_overlap(a: &str, b: &str) -> bool {
    let a = Path::new(a);
    let b = Path::new(b);
    a.starts_with(b) || b.starts_with(a)
}
