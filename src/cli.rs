//! CLI: clap types for mirror and command execution.

use crate::config::{ConfigLoader, MirrorConfig};
use crate::daemon::{DaemonConfig, SyncDaemon};
use crate::error::MirrorError;
use crate::sync::report::format_report_text;
use crate::sync::{Reconciler, TracingSink};
use crate::tree::hasher::ContentComparator;
use crate::tree::path::prepare_roots;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Mirror - keep a replica directory identical to a source directory
#[derive(Parser, Debug)]
#[command(name = "mirror")]
#[command(about = "One-way periodic mirroring of a source folder into a replica folder")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the source folder
    #[arg(long, global = true)]
    pub source: Option<PathBuf>,

    /// Path to the replica folder
    #[arg(long, global = true)]
    pub replica: Option<PathBuf>,

    /// Path to the log file (logs go to both console and this file)
    #[arg(long, global = true)]
    pub log: Option<PathBuf>,

    /// Configuration file path (layered over the global config)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, both)
    #[arg(long, global = true)]
    pub log_output: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Synchronize periodically until interrupted
    Run {
        /// Synchronization interval in seconds
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Run a single synchronization cycle and print a summary
    Once {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

/// Result of executing a command
#[derive(Debug)]
pub struct CommandOutcome {
    pub output: String,
    pub success: bool,
}

/// Load configuration files and layer command-line flags on top
pub fn resolve_config(cli: &Cli) -> Result<MirrorConfig, MirrorError> {
    let config = ConfigLoader::load(cli.config.as_deref())?;
    Ok(apply_overrides(config, cli))
}

/// Command-line flags take precedence over every other source
pub fn apply_overrides(mut config: MirrorConfig, cli: &Cli) -> MirrorConfig {
    if let Some(ref source) = cli.source {
        config.sync.source = Some(source.clone());
    }
    if let Some(ref replica) = cli.replica {
        config.sync.replica = Some(replica.clone());
    }
    if let Commands::Run {
        interval: Some(interval),
    } = cli.command
    {
        config.sync.interval_secs = interval;
    }

    if let Some(ref log) = cli.log {
        config.logging.file = log.clone();
        // A log file means console plus file unless an output is given explicitly
        config.logging.output = "both".to_string();
    }
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.logging.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        config.logging.output = output.clone();
    }

    config
}

/// Output format of the `once` summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn parse(format: &str) -> Result<Self, MirrorError> {
        match format {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            other => Err(MirrorError::Config(format!(
                "Invalid output format: {} (must be 'text' or 'json')",
                other
            ))),
        }
    }
}

/// Everything needed to execute a command against validated roots
pub struct RunContext {
    config: MirrorConfig,
    reconciler: Reconciler,
}

impl RunContext {
    /// Validate configuration and prepare both roots (creating them if missing)
    pub fn new(config: MirrorConfig) -> Result<Self, MirrorError> {
        config.ensure_valid()?;
        let (source, replica) = match (&config.sync.source, &config.sync.replica) {
            (Some(source), Some(replica)) => prepare_roots(source, replica)?,
            _ => return Err(MirrorError::Config("source and replica are required".to_string())),
        };

        info!(source = %source.display(), "Source folder");
        info!(replica = %replica.display(), "Replica folder");

        let reconciler = Reconciler::new(source, replica)
            .with_comparator(ContentComparator::new(config.sync.chunk_size))
            .with_sink(Arc::new(TracingSink));

        Ok(Self { config, reconciler })
    }

    pub fn execute(self, command: &Commands) -> Result<CommandOutcome, MirrorError> {
        match command {
            Commands::Run { .. } => self.handle_run(),
            Commands::Once { format } => self.handle_once(format),
        }
    }

    fn handle_once(self, format: &str) -> Result<CommandOutcome, MirrorError> {
        // Reject a bad format before the replica is touched
        let format = ReportFormat::parse(format)?;
        let daemon = SyncDaemon::new(self.reconciler, DaemonConfig::default());
        let report = daemon.run_once();
        let output = match format {
            ReportFormat::Json => serde_json::to_string_pretty(&report)
                .map_err(|e| MirrorError::Config(format!("Failed to render report: {}", e)))?,
            ReportFormat::Text => format_report_text(&report),
        };
        Ok(CommandOutcome {
            output,
            success: report.is_clean(),
        })
    }

    fn handle_run(self) -> Result<CommandOutcome, MirrorError> {
        info!(interval_secs = self.config.sync.interval_secs, "Synchronization interval");
        let daemon = SyncDaemon::new(
            self.reconciler,
            DaemonConfig {
                interval: self.config.sync.interval(),
            },
        );
        let cycles = run_until_interrupted(daemon)?;
        Ok(CommandOutcome {
            output: format!("Synchronization stopped after {} cycle(s)", cycles),
            success: true,
        })
    }
}

/// Drive the daemon on a blocking thread; Ctrl-C stops it between cycles
fn run_until_interrupted(daemon: SyncDaemon) -> Result<u64, MirrorError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let stop = daemon.stop_handle();
        let mut worker = tokio::task::spawn_blocking(move || daemon.start());

        tokio::select! {
            joined = &mut worker => return joined.map_err(join_error),
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    warn!("Failed to listen for interrupt: {}", e);
                    return worker.await.map_err(join_error);
                }
                info!("Interrupt received, finishing the current cycle");
                stop.stop();
            }
        }

        let cycles = worker.await.map_err(join_error)?;
        info!("Synchronization stopped by user");
        Ok(cycles)
    })
}

fn join_error(err: tokio::task::JoinError) -> MirrorError {
    MirrorError::Io(std::io::Error::new(
        std::io::ErrorKind::Other,
        format!("Synchronization thread failed: {}", err),
    ))
}
