//! Per-cycle summary of what the reconciler did.

use crate::sync::events::{EventKind, SyncEvent};
use chrono::{DateTime, Utc};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub dirs_created: u64,
    pub files_copied: u64,
    pub files_updated: u64,
    pub files_deleted: u64,
    pub dirs_deleted: u64,
    pub errors: u64,
}

impl CycleReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            duration_ms: 0,
            dirs_created: 0,
            files_copied: 0,
            files_updated: 0,
            files_deleted: 0,
            dirs_deleted: 0,
            errors: 0,
        }
    }

    pub fn record(&mut self, event: &SyncEvent) {
        match event.kind {
            EventKind::DirCreated => self.dirs_created += 1,
            EventKind::FileCopied => self.files_copied += 1,
            EventKind::FileUpdated => self.files_updated += 1,
            EventKind::FileDeleted => self.files_deleted += 1,
            EventKind::DirDeleted => self.dirs_deleted += 1,
            EventKind::Error => self.errors += 1,
        }
    }

    /// Number of state-changing actions taken on the replica
    pub fn changes(&self) -> u64 {
        self.dirs_created
            + self.files_copied
            + self.files_updated
            + self.files_deleted
            + self.dirs_deleted
    }

    /// True when the cycle recorded no errors
    pub fn is_clean(&self) -> bool {
        self.errors == 0
    }
}

/// Human-readable rendering of a cycle report
pub fn format_report_text(report: &CycleReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", "Synchronization cycle".bold().underline()));
    out.push_str(&format!(
        "  Started: {}\n  Duration: {} ms\n\n",
        report.started_at.to_rfc3339(),
        report.duration_ms
    ));

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Action", "Count"]);
    table.add_row(vec!["Folders created".to_string(), report.dirs_created.to_string()]);
    table.add_row(vec!["Files copied".to_string(), report.files_copied.to_string()]);
    table.add_row(vec!["Files updated".to_string(), report.files_updated.to_string()]);
    table.add_row(vec!["Files deleted".to_string(), report.files_deleted.to_string()]);
    table.add_row(vec!["Folders deleted".to_string(), report.dirs_deleted.to_string()]);
    table.add_row(vec!["Errors".to_string(), report.errors.to_string()]);
    out.push_str(&format!("{}\n\n", table));

    if report.is_clean() {
        out.push_str(&format!("{}\n", "Replica is in sync.".green()));
    } else {
        out.push_str(&format!(
            "{}\n",
            format!("{} error(s); see the log for details.", report.errors).red()
        ));
    }
    out
}
