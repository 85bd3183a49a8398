//! Shared fixtures for integration tests
//!
//! Builds source/replica trees inside a temporary directory and snapshots them
//! for comparison.

use mirror::sync::{MemorySink, Reconciler};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use walkdir::WalkDir;

/// Content of a tree entry: `None` for directories
pub type Snapshot = BTreeMap<PathBuf, Option<Vec<u8>>>;

/// A source root and a replica root side by side in one temp dir
pub struct Fixture {
    _temp: TempDir,
    pub source: PathBuf,
    pub replica: PathBuf,
    pub sink: Arc<MemorySink>,
}

impl Fixture {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source");
        let replica = temp.path().join("replica");
        fs::create_dir(&source).unwrap();
        fs::create_dir(&replica).unwrap();
        Self {
            _temp: temp,
            source,
            replica,
            sink: Arc::new(MemorySink::new()),
        }
    }

    pub fn reconciler(&self) -> Reconciler {
        Reconciler::new(&self.source, &self.replica).with_sink(self.sink.clone())
    }
}

/// Write files (and their parent folders) under `root`
pub fn write_files(root: &Path, files: &[(&str, &str)]) {
    for (rel, content) in files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
}

/// Every entry under `root` (excluding `root` itself) keyed by relative path
pub fn snapshot(root: &Path) -> Snapshot {
    WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .map(|e| {
            let e = e.unwrap();
            let rel = e.path().strip_prefix(root).unwrap().to_path_buf();
            let content = if e.file_type().is_dir() {
                None
            } else {
                Some(fs::read(e.path()).unwrap())
            };
            (rel, content)
        })
        .collect()
}
