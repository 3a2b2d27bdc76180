use crate::error::{ReplError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Objects scheduled ahead of a preferred read by the prefetching strategy,
/// on top of the number of currently preferred objects.
pub const DEFAULT_PREFETCHING_COUNT: usize = 5;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplicationConfig {
    #[serde(default)]
    pub transfer: TransferConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    #[serde(default = "default_prefetching_count")]
    pub prefetching_count: usize,
    /// Seed for random object selection. Unset means seeded from entropy.
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            prefetching_count: default_prefetching_count(),
            rng_seed: None,
        }
    }
}

fn default_prefetching_count() -> usize {
    DEFAULT_PREFETCHING_COUNT
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_sync_on_append")]
    pub sync_on_append: bool,
    /// Cut a torn trailing record off on open instead of failing.
    #[serde(default)]
    pub truncate_corrupt_tail: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            sync_on_append: default_sync_on_append(),
            truncate_corrupt_tail: false,
        }
    }
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("interval-logs")
}

fn default_sync_on_append() -> bool {
    true
}

impl ReplicationConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::with_name(path))
            .add_source(::config::Environment::with_prefix("RIMIO_REPL").separator("__"))
            .build()
            .map_err(|e| ReplError::Config(e.to_string()))?;

        let config: ReplicationConfig = settings
            .try_deserialize()
            .map_err(|e| ReplError::Config(e.to_string()))?;

        Ok(config)
    }
}
