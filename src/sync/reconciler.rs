//! Tree reconciliation: converge the replica tree onto the source tree.
//!
//! A cycle has two phases:
//!
//! 1. **Propagate** walks source top-down. Missing replica directories are
//!    created, missing files copied, and files whose digests differ are
//!    overwritten.
//! 2. **Prune** walks replica bottom-up and removes every entry that has no
//!    source counterpart of the same kind. Directories are decided only after
//!    their contents have been visited.
//!
//! Every failure is local to one path: it is reported as an `Error` event and
//! the walk continues. Source is only ever read.

use crate::error::SyncError;
use crate::sync::events::{EventKind, EventSink, SyncEvent, TracingSink};
use crate::sync::report::CycleReport;
use crate::tree::hasher::{ComparisonResult, ContentComparator};
use crate::tree::path::counterpart;
use crate::tree::walker::{probe, EntryKind, Walker};
use chrono::Utc;
use std::collections::HashSet;
use std::fs::{self, File, FileTimes};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// One-way mirror from a source root into a replica root
pub struct Reconciler {
    source_root: PathBuf,
    replica_root: PathBuf,
    comparator: ContentComparator,
    sink: Arc<dyn EventSink>,
}

impl Reconciler {
    /// Create a reconciler that reports through `tracing`
    pub fn new(source_root: impl Into<PathBuf>, replica_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            replica_root: replica_root.into(),
            comparator: ContentComparator::default(),
            sink: Arc::new(TracingSink),
        }
    }

    pub fn with_comparator(mut self, comparator: ContentComparator) -> Self {
        self.comparator = comparator;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    pub fn replica_root(&self) -> &Path {
        &self.replica_root
    }

    /// Run one full propagate + prune pass
    ///
    /// Never fails as a whole; per-path failures are counted in the report's
    /// `errors` field and delivered to the sink.
    pub fn run_cycle(&self) -> CycleReport {
        let started = Instant::now();
        let mut cycle = Cycle {
            reconciler: self,
            report: CycleReport::new(Utc::now()),
        };

        cycle.propagate();
        cycle.prune();

        cycle.report.duration_ms = started.elapsed().as_millis() as u64;
        cycle.report
    }
}

/// State of a single in-progress cycle
struct Cycle<'a> {
    reconciler: &'a Reconciler,
    report: CycleReport,
}

impl Cycle<'_> {
    fn emit(&mut self, event: SyncEvent) {
        self.report.record(&event);
        self.reconciler.sink.emit(&event);
    }

    fn fail(&mut self, err: SyncError) {
        self.emit(SyncEvent::failure(&err));
    }

    fn source_root(&self) -> &Path {
        &self.reconciler.source_root
    }

    fn replica_root(&self) -> &Path {
        &self.reconciler.replica_root
    }

    // ---- propagate -------------------------------------------------------

    fn propagate(&mut self) {
        let walker = Walker::new(self.source_root().to_path_buf());
        let mut entries = walker.iter();

        while let Some(entry) = entries.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    // Unlistable source directory: nothing under it is propagated
                    self.fail(SyncError::from(e));
                    continue;
                }
            };

            let source_path = entry.path();
            let Some(replica_path) =
                counterpart(self.source_root(), self.replica_root(), source_path)
            else {
                continue;
            };

            match EntryKind::from_file_type(entry.file_type()) {
                EntryKind::Directory => {
                    if !self.ensure_replica_dir(&replica_path) {
                        entries.skip_current_dir();
                    }
                }
                EntryKind::File => self.propagate_file(source_path, &replica_path),
                kind => self.fail(SyncError::Unsupported {
                    path: source_path.to_path_buf(),
                    reason: format!("{} entries are not mirrored", kind.label()),
                }),
            }
        }
    }

    /// Make `replica_dir` an existing directory; false if the subtree must be skipped
    fn ensure_replica_dir(&mut self, replica_dir: &Path) -> bool {
        let existing = match probe(replica_dir) {
            Ok(kind) => kind,
            Err(e) => {
                self.fail(SyncError::read(replica_dir, e));
                return false;
            }
        };

        match existing {
            Some(EntryKind::Directory) => return true,
            Some(kind) => {
                // Kind changed since the last cycle: drop the stale entry first
                if !self.remove_entry(replica_dir, kind) {
                    return false;
                }
            }
            None => {}
        }

        match fs::create_dir_all(replica_dir) {
            Ok(()) => {
                self.emit(SyncEvent::new(EventKind::DirCreated, replica_dir));
                true
            }
            Err(e) => {
                self.fail(SyncError::write("create folder", replica_dir, e));
                false
            }
        }
    }

    fn propagate_file(&mut self, source_file: &Path, replica_file: &Path) {
        let existing = match probe(replica_file) {
            Ok(kind) => kind,
            Err(e) => {
                self.fail(SyncError::read(replica_file, e));
                return;
            }
        };

        let kind = match existing {
            None => EventKind::FileCopied,
            Some(EntryKind::File) => {
                match self
                    .reconciler
                    .comparator
                    .contents_equal(source_file, replica_file)
                {
                    ComparisonResult::Identical => {
                        debug!(path = %replica_file.display(), "File unchanged");
                        return;
                    }
                    ComparisonResult::Different => EventKind::FileUpdated,
                    ComparisonResult::Unreadable(err) => {
                        // Inconclusive comparison: report it and re-copy anyway
                        self.fail(err);
                        EventKind::FileUpdated
                    }
                }
            }
            Some(other) => {
                if !self.remove_entry(replica_file, other) {
                    return;
                }
                EventKind::FileCopied
            }
        };

        match copy_file(source_file, replica_file) {
            Ok(()) => self.emit(
                SyncEvent::new(kind, replica_file)
                    .with_detail(format!("from {}", source_file.display())),
            ),
            Err(err) => self.fail(err),
        }
    }

    // ---- prune -----------------------------------------------------------

    fn prune(&mut self) {
        let walker = Walker::post_order(self.replica_root().to_path_buf());
        // Directories whose listing failed are left alone for this cycle
        let mut unlisted: HashSet<PathBuf> = HashSet::new();

        for entry in walker.iter() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    if let Some(dir) = e.path() {
                        unlisted.insert(dir.to_path_buf());
                    }
                    self.fail(SyncError::from(e));
                    continue;
                }
            };

            // The replica root always corresponds to the source root
            if entry.depth() == 0 {
                continue;
            }

            let replica_path = entry.path();
            let Some(source_path) =
                counterpart(self.replica_root(), self.source_root(), replica_path)
            else {
                continue;
            };
            let kind = EntryKind::from_file_type(entry.file_type());

            if kind == EntryKind::Directory && unlisted.contains(replica_path) {
                warn!(path = %replica_path.display(), "Skipping prune of unlisted folder");
                continue;
            }

            match probe(&source_path) {
                Ok(Some(source_kind)) if source_kind == kind && kind.is_mirrored() => {}
                Ok(_) => {
                    self.remove_entry(replica_path, kind);
                }
                Err(e) => self.fail(SyncError::read(source_path, e)),
            }
        }
    }

    // ---- shared ----------------------------------------------------------

    /// Remove a replica entry of the given kind; directories go recursively
    fn remove_entry(&mut self, path: &Path, kind: EntryKind) -> bool {
        let (result, action, event) = match kind {
            EntryKind::Directory => (fs::remove_dir_all(path), "delete folder", EventKind::DirDeleted),
            _ => (fs::remove_file(path), "delete file", EventKind::FileDeleted),
        };

        match result {
            Ok(()) => {
                self.emit(SyncEvent::new(event, path));
                true
            }
            Err(e) => {
                self.fail(SyncError::write(action, path, e));
                false
            }
        }
    }
}

/// Copy content and permission bits, then carry over access/modification times
fn copy_file(source: &Path, target: &Path) -> Result<(), SyncError> {
    // An unreadable source is a read failure on the source, not a write failure
    let meta = File::open(source)
        .and_then(|file| file.metadata())
        .map_err(|e| SyncError::read(source, e))?;

    // A read-only replica file from an earlier copy cannot be opened for writing
    if let Ok(existing) = fs::symlink_metadata(target) {
        if existing.is_file() && existing.permissions().readonly() {
            fs::remove_file(target).map_err(|e| SyncError::write("replace", target, e))?;
        }
    }

    fs::copy(source, target).map_err(|e| SyncError::write("copy", target, e))?;

    let mut times = FileTimes::new();
    if let Ok(modified) = meta.modified() {
        times = times.set_modified(modified);
    }
    if let Ok(accessed) = meta.accessed() {
        times = times.set_accessed(accessed);
    }

    open_for_times(target)
        .and_then(|file| file.set_times(times))
        .map_err(|e| SyncError::write("set times on", target, e))
}

/// Handle that can change timestamps even when the copy is read-only
#[cfg(not(windows))]
fn open_for_times(path: &Path) -> std::io::Result<File> {
    File::open(path)
}

#[cfg(windows)]
fn open_for_times(path: &Path) -> std::io::Result<File> {
    use std::os::windows::fs::OpenOptionsExt;
    const FILE_WRITE_ATTRIBUTES: u32 = 0x0100;
    std::fs::OpenOptions::new()
        .access_mode(FILE_WRITE_ATTRIBUTES)
        .open(path)
}
