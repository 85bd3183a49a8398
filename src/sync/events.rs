//! Event schema for reconciliation observability.
//!
//! The reconciler reports every state-changing action and every non-fatal
//! failure as a [`SyncEvent`] delivered to an [`EventSink`]. Emission is
//! fire-and-forget: sinks cannot fail the cycle.

use crate::error::SyncError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    DirCreated,
    FileCopied,
    FileUpdated,
    FileDeleted,
    DirDeleted,
    Error,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::DirCreated => "dir_created",
            EventKind::FileCopied => "file_copied",
            EventKind::FileUpdated => "file_updated",
            EventKind::FileDeleted => "file_deleted",
            EventKind::DirDeleted => "dir_deleted",
            EventKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncEvent {
    pub kind: EventKind,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl SyncEvent {
    pub fn new(kind: EventKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Error event for a per-path failure
    pub fn failure(err: &SyncError) -> Self {
        Self {
            kind: EventKind::Error,
            path: err.path().to_path_buf(),
            detail: Some(format!("[{}] {}", err.class(), err)),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == EventKind::Error
    }
}

/// Receiver of reconciliation events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &SyncEvent);
}

/// Forwards events to `tracing`: changes at info, failures at error
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &SyncEvent) {
        let detail = event.detail.as_deref().unwrap_or("");
        if event.is_error() {
            error!(
                kind = event.kind.as_str(),
                path = %event.path.display(),
                detail,
                "Synchronization error"
            );
        } else {
            info!(
                kind = event.kind.as_str(),
                path = %event.path.display(),
                detail,
                "{}",
                describe(event.kind)
            );
        }
    }
}

fn describe(kind: EventKind) -> &'static str {
    match kind {
        EventKind::DirCreated => "Created folder",
        EventKind::FileCopied => "Copied file",
        EventKind::FileUpdated => "Updated file",
        EventKind::FileDeleted => "Deleted file",
        EventKind::DirDeleted => "Deleted folder",
        EventKind::Error => "Synchronization error",
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<SyncEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events received so far
    pub fn events(&self) -> Vec<SyncEvent> {
        self.events.lock().clone()
    }

    /// Remove and return all events received so far
    pub fn drain(&self) -> Vec<SyncEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn of_kind(&self, kind: EventKind) -> Vec<SyncEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.kind == kind)
            .cloned()
            .collect()
    }

    /// Whether an event of `kind` was recorded for a path ending in `suffix`
    pub fn contains(&self, kind: EventKind, suffix: impl AsRef<Path>) -> bool {
        let suffix = suffix.as_ref();
        self.events
            .lock()
            .iter()
            .any(|e| e.kind == kind && e.path.ends_with(suffix))
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: &SyncEvent) {
        self.events.lock().push(event.clone());
    }
}

/// Delivers each event to several sinks in order
#[derive(Default, Clone)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl EventSink for FanoutSink {
    fn emit(&self, event: &SyncEvent) {
        for sink in &self.sinks {
            sink.emit(event);
        }
    }
}
