//! Filesystem walker for traversing the source and replica trees

use std::fs::FileType;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Kind of a filesystem entry, as seen without following symlinks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    /// Sockets, FIFOs, devices
    Other,
}

impl EntryKind {
    pub fn from_file_type(file_type: FileType) -> Self {
        if file_type.is_symlink() {
            EntryKind::Symlink
        } else if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Directory => "directory",
            EntryKind::Symlink => "symlink",
            EntryKind::Other => "special file",
        }
    }

    /// Only plain files and directories are mirrored
    pub fn is_mirrored(&self) -> bool {
        matches!(self, EntryKind::File | EntryKind::Directory)
    }
}

/// Classify `path` without following a trailing symlink
///
/// Returns `Ok(None)` when nothing exists at `path`.
pub fn probe(path: &Path) -> io::Result<Option<EntryKind>> {
    match std::fs::symlink_metadata(path) {
        Ok(meta) => Ok(Some(EntryKind::from_file_type(meta.file_type()))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Filesystem walker configuration
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Yield directory contents before the directory itself (post-order)
    pub contents_first: bool,
}

/// Filesystem walker
///
/// Symlinks are never followed and entries within a directory are yielded in
/// file-name order. The root itself is yielded at depth 0.
pub struct Walker {
    root: PathBuf,
    config: WalkerConfig,
}

impl Walker {
    /// Top-down walker: every directory is yielded before its contents
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            config: WalkerConfig::default(),
        }
    }

    /// Bottom-up walker: every directory is yielded after its contents
    pub fn post_order(root: PathBuf) -> Self {
        Self::with_config(
            root,
            WalkerConfig {
                contents_first: true,
            },
        )
    }

    pub fn with_config(root: PathBuf, config: WalkerConfig) -> Self {
        Self { root, config }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Start the traversal
    pub fn iter(&self) -> walkdir::IntoIter {
        WalkDir::new(&self.root)
            .follow_links(false)
            .contents_first(self.config.contents_first)
            .sort_by_file_name()
            .into_iter()
    }
}
