//! Path mapping between the source and replica roots

use crate::error::MirrorError;
use std::path::{Path, PathBuf};
use tracing::info;

/// Path of `path` relative to `root`, or None if it lies outside `root`
pub fn relative_to(root: &Path, path: &Path) -> Option<PathBuf> {
    path.strip_prefix(root).ok().map(Path::to_path_buf)
}

/// Map a path under `from_root` to the same relative location under `to_root`
pub fn counterpart(from_root: &Path, to_root: &Path, path: &Path) -> Option<PathBuf> {
    relative_to(from_root, path).map(|rel| {
        if rel.as_os_str().is_empty() {
            to_root.to_path_buf()
        } else {
            to_root.join(rel)
        }
    })
}

/// Make sure both roots exist as directories and do not overlap
///
/// Missing roots are created. Returns the canonical (source, replica) pair.
/// Identical or nested roots are rejected: mirroring a tree into itself
/// would either destroy the source or grow without bound.
pub fn prepare_roots(source: &Path, replica: &Path) -> Result<(PathBuf, PathBuf), MirrorError> {
    let source = ensure_dir(source, "source")?;
    let replica = ensure_dir(replica, "replica")?;

    if source == replica {
        return Err(MirrorError::InvalidRoots(format!(
            "source and replica are the same directory: {}",
            source.display()
        )));
    }
    if replica.starts_with(&source) {
        return Err(MirrorError::InvalidRoots(format!(
            "replica {} lies inside source {}",
            replica.display(),
            source.display()
        )));
    }
    if source.starts_with(&replica) {
        return Err(MirrorError::InvalidRoots(format!(
            "source {} lies inside replica {}",
            source.display(),
            replica.display()
        )));
    }

    Ok((source, replica))
}

fn ensure_dir(path: &Path, role: &str) -> Result<PathBuf, MirrorError> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| {
            MirrorError::InvalidRoots(format!(
                "failed to create {} folder {}: {}",
                role,
                path.display(),
                e
            ))
        })?;
        info!(role, path = %path.display(), "Created root folder");
    }
    if !path.is_dir() {
        return Err(MirrorError::InvalidRoots(format!(
            "{} {} is not a directory",
            role,
            path.display()
        )));
    }
    dunce::canonicalize(path).map_err(|e| {
        MirrorError::InvalidRoots(format!(
            "failed to canonicalize {} {}: {}",
            role,
            path.display(),
            e
        ))
    })
}
