//! Error types for the mirror synchronization daemon.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Per-path failures raised while reconciling a single entry.
///
/// None of these abort a cycle: the reconciler turns each one into an
/// `Error` event and moves on to the next entry.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to {action} {path:?}: {source}")]
    Write {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to list directory {path:?}: {message}")]
    Traversal { path: PathBuf, message: String },

    #[error("Unsupported entry {path:?}: {reason}")]
    Unsupported { path: PathBuf, reason: String },
}

impl SyncError {
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Read {
            path: path.into(),
            source,
        }
    }

    pub fn write(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Write {
            action,
            path: path.into(),
            source,
        }
    }

    /// Path the failure is attributed to
    pub fn path(&self) -> &Path {
        match self {
            SyncError::Read { path, .. }
            | SyncError::Write { path, .. }
            | SyncError::Traversal { path, .. }
            | SyncError::Unsupported { path, .. } => path,
        }
    }

    /// Short name of the failure class, used as a structured log field
    pub fn class(&self) -> &'static str {
        match self {
            SyncError::Read { .. } => "read",
            SyncError::Write { .. } => "write",
            SyncError::Traversal { .. } => "traversal",
            SyncError::Unsupported { .. } => "unsupported",
        }
    }
}

impl From<walkdir::Error> for SyncError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(Path::to_path_buf).unwrap_or_default();
        SyncError::Traversal {
            path,
            message: err.to_string(),
        }
    }
}

/// Process-level errors (startup, configuration, logging)
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid roots: {0}")]
    InvalidRoots(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for MirrorError {
    fn from(err: config::ConfigError) -> Self {
        MirrorError::Config(err.to_string())
    }
}
