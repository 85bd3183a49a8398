//! Configuration System
//!
//! Layered configuration for the mirror daemon. Sources, lowest precedence first:
//!
//! 1. Built-in defaults
//! 2. Global file: `$XDG_CONFIG_HOME/mirror/config.toml` or `~/.config/mirror/config.toml`
//! 3. An explicit file passed with `--config`
//! 4. Environment variables, e.g. `MIRROR_SYNC__SOURCE`, `MIRROR_SYNC__INTERVAL_SECS`
//!
//! Command-line flags are applied on top by the CLI.

use crate::error::MirrorError;
use crate::logging::LoggingConfig;
use crate::tree::hasher::DEFAULT_CHUNK_SIZE;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MirrorConfig {
    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// What to mirror and how often
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Source root (ground truth, never modified)
    #[serde(default)]
    pub source: Option<PathBuf>,

    /// Replica root (kept identical to source)
    #[serde(default)]
    pub replica: Option<PathBuf>,

    /// Seconds between cycles
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Read chunk size for content digests
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_interval_secs() -> u64 {
    60
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            source: None,
            replica: None,
            interval_secs: default_interval_secs(),
            chunk_size: default_chunk_size(),
        }
    }
}

impl SyncConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MissingSource,
    MissingReplica,
    ZeroInterval,
    ZeroChunkSize,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::MissingSource => write!(f, "sync.source is not set (use --source)"),
            ValidationError::MissingReplica => {
                write!(f, "sync.replica is not set (use --replica)")
            }
            ValidationError::ZeroInterval => write!(f, "sync.interval_secs must be at least 1"),
            ValidationError::ZeroChunkSize => write!(f, "sync.chunk_size must be at least 1"),
        }
    }
}

impl std::error::Error for ValidationError {}

impl MirrorConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.sync.source.is_none() {
            errors.push(ValidationError::MissingSource);
        }
        if self.sync.replica.is_none() {
            errors.push(ValidationError::MissingReplica);
        }
        if self.sync.interval_secs == 0 {
            errors.push(ValidationError::ZeroInterval);
        }
        if self.sync.chunk_size == 0 {
            errors.push(ValidationError::ZeroChunkSize);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate and fold all problems into one error
    pub fn ensure_valid(&self) -> Result<(), MirrorError> {
        self.validate().map_err(|errors| {
            let msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            MirrorError::Config(format!(
                "Configuration validation failed:\n{}",
                msgs.join("\n")
            ))
        })
    }
}

/// Builds a [`MirrorConfig`] from files and the environment
pub struct ConfigLoader;

impl ConfigLoader {
    /// Path to the global config file, if a config home can be determined
    pub fn global_config_path() -> Option<PathBuf> {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
        Some(base.join("mirror").join("config.toml"))
    }

    /// Load defaults, the global file, `explicit` (if any), then the environment
    pub fn load(explicit: Option<&Path>) -> Result<MirrorConfig, MirrorError> {
        let mut builder = Config::builder();

        if let Some(global) = Self::global_config_path() {
            if global.exists() {
                debug!(config_path = %global.display(), "Loading global configuration");
                builder = builder.add_source(File::from(global.as_path()).format(FileFormat::Toml));
            }
        }

        if let Some(path) = explicit {
            builder = builder.add_source(
                File::from(path)
                    .format(FileFormat::Toml)
                    .required(true),
            );
        }

        builder = builder.add_source(
            Environment::with_prefix("MIRROR")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: MirrorConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Load a single TOML file on top of the defaults, ignoring other sources
    pub fn load_from_file(path: &Path) -> Result<MirrorConfig, MirrorError> {
        let config: MirrorConfig = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml).required(true))
            .build()?
            .try_deserialize()?;
        Ok(config)
    }
}
