//! Periodic Synchronization Daemon
//!
//! Runs one reconciliation cycle, waits for the configured interval, and
//! repeats. Cycles never overlap: the loop is a single blocking thread. A stop
//! request is only observed between cycles, so an in-progress cycle always
//! runs to completion.

use crate::sync::{CycleReport, Reconciler};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;
use tracing::{info, warn};

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Pause between the end of one cycle and the start of the next
    pub interval: Duration,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
        }
    }
}

/// Requests the daemon to stop after the current cycle
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: Sender<()>,
}

impl StopHandle {
    pub fn stop(&self) {
        // The daemon may already be gone; nothing left to stop then
        let _ = self.tx.send(());
    }
}

/// Periodic driver around a [`Reconciler`]
pub struct SyncDaemon {
    reconciler: Reconciler,
    config: DaemonConfig,
    stop_tx: Sender<()>,
    stop_rx: Receiver<()>,
}

impl SyncDaemon {
    pub fn new(reconciler: Reconciler, config: DaemonConfig) -> Self {
        let (stop_tx, stop_rx) = mpsc::channel();
        Self {
            reconciler,
            config,
            stop_tx,
            stop_rx,
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            tx: self.stop_tx.clone(),
        }
    }

    /// Run a single cycle and log its summary
    pub fn run_once(&self) -> CycleReport {
        info!("Starting a new synchronization cycle");
        let report = self.reconciler.run_cycle();
        if report.is_clean() {
            info!(
                changes = report.changes(),
                duration_ms = report.duration_ms,
                "Cycle complete"
            );
        } else {
            warn!(
                changes = report.changes(),
                errors = report.errors,
                duration_ms = report.duration_ms,
                "Cycle complete with errors"
            );
        }
        report
    }

    /// Loop until a stop is requested; returns the number of cycles run
    pub fn start(&self) -> u64 {
        info!(
            source = %self.reconciler.source_root().display(),
            replica = %self.reconciler.replica_root().display(),
            interval_secs = self.config.interval.as_secs(),
            "Starting folder synchronization"
        );

        let mut cycles = 0u64;
        loop {
            self.run_once();
            cycles += 1;

            info!("Waiting for next cycle");
            match self.stop_rx.recv_timeout(self.config.interval) {
                Err(RecvTimeoutError::Timeout) => continue,
                // `self` holds a sender, so disconnection cannot happen; treat it as stop
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        info!(cycles, "Synchronization stopped");
        cycles
    }
}
