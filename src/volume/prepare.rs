//! Volume preparation.
//!
//! The native replacement for the one-shot initializer the original
//! deployment ran: create every subpath under the volume root, then fix
//! ownership of the regions that declare an owner. All directory creation is
//! idempotent; any failure aborts preparation with an error so the unit
//! reports a non-success outcome and dependents stay gated.

use std::fs;
use std::os::unix::fs::chown;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::Owner;
use crate::volume::layout::VolumeLayout;

/// Error raised while preparing the volume.
#[derive(Debug, Error)]
pub enum PrepareError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to set ownership of {path} to {uid}:{gid}: {source}")]
    Chown {
        path: PathBuf,
        uid: u32,
        gid: u32,
        source: std::io::Error,
    },

    #[error("failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Create all subpaths and apply configured ownership.
pub fn prepare(layout: &VolumeLayout) -> Result<(), PrepareError> {
    for subpath in layout.subpaths() {
        let path = layout.root().join(&subpath.name);

        fs::create_dir_all(&path).map_err(|source| PrepareError::CreateDir {
            path: path.clone(),
            source,
        })?;

        tracing::debug!(path = %path.display(), "volume subpath ready");

        if let Some(owner) = subpath.owner {
            chown_recursive(&path, owner)?;
            tracing::info!(
                path = %path.display(),
                uid = owner.uid,
                gid = owner.gid,
                "volume subpath ownership applied"
            );
        }
    }

    Ok(())
}

/// Set ownership of a directory subtree to the given numeric uid/gid.
fn chown_recursive(path: &Path, owner: Owner) -> Result<(), PrepareError> {
    chown(path, Some(owner.uid), Some(owner.gid)).map_err(|source| PrepareError::Chown {
        path: path.to_path_buf(),
        uid: owner.uid,
        gid: owner.gid,
        source,
    })?;

    let entries = fs::read_dir(path).map_err(|source| PrepareError::ReadDir {
        path: path.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| PrepareError::ReadDir {
            path: path.to_path_buf(),
            source,
        })?;
        let entry_path = entry.path();

        // Symlinks are chowned as links, not followed.
        let file_type = entry.file_type().map_err(|source| PrepareError::ReadDir {
            path: entry_path.clone(),
            source,
        })?;
        if file_type.is_dir() {
            chown_recursive(&entry_path, owner)?;
        } else {
            std::os::unix::fs::lchown(&entry_path, Some(owner.uid), Some(owner.gid)).map_err(
                |source| PrepareError::Chown {
                    path: entry_path.clone(),
                    uid: owner.uid,
                    gid: owner.gid,
                    source,
                },
            )?;
        }
    }

    Ok(())
}
