//! Configuration for EmberKV
//!
//! Centralized configuration with sensible defaults. Every file location
//! is explicit so nothing is baked into the components themselves.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{EmberError, Result};

/// Main configuration for an EmberKV instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Append-only log of every mutation
    pub log_path: PathBuf,

    /// Consolidated key/value snapshot, rewritten by each checkpoint
    pub snapshot_path: PathBuf,

    /// Last sequence number folded into the snapshot
    pub checkpoint_path: PathBuf,

    // -------------------------------------------------------------------------
    // WAL Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync WAL
    pub wal_sync_strategy: WalSyncStrategy,

    // -------------------------------------------------------------------------
    // Checkpoint Configuration
    // -------------------------------------------------------------------------
    /// Time between two background checkpoint cycles
    pub checkpoint_interval: Duration,

    /// Start the background checkpointer on open.
    /// When false, checkpoints only run through `Engine::checkpoint`.
    pub background_checkpoint: bool,
}

/// WAL sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalSyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N uncommitted entries (balanced durability/performance)
    EveryNEntries { count: usize },
}

impl Config {
    const WAL_FILENAME: &'static str = "wal.log";
    const SNAPSHOT_FILENAME: &'static str = "snapshot.db";
    const CHECKPOINT_FILENAME: &'static str = "checkpoint.meta";

    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Config with all files placed under `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::builder().data_dir(dir.as_ref()).build()
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.checkpoint_interval.is_zero() {
            return Err(EmberError::Config(
                "checkpoint_interval must be greater than zero".to_string(),
            ));
        }

        if let WalSyncStrategy::EveryNEntries { count: 0 } = self.wal_sync_strategy {
            return Err(EmberError::Config(
                "EveryNEntries count must be greater than zero".to_string(),
            ));
        }

        let paths = [&self.log_path, &self.snapshot_path, &self.checkpoint_path];
        for (i, a) in paths.iter().enumerate() {
            for b in &paths[i + 1..] {
                if a == b {
                    return Err(EmberError::Config(format!(
                        "file path {} is used twice",
                        a.display()
                    )));
                }
            }
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        let dir = PathBuf::from("./emberkv_data");
        Self {
            log_path: dir.join(Self::WAL_FILENAME),
            snapshot_path: dir.join(Self::SNAPSHOT_FILENAME),
            checkpoint_path: dir.join(Self::CHECKPOINT_FILENAME),
            wal_sync_strategy: WalSyncStrategy::EveryWrite,
            checkpoint_interval: Duration::from_secs(10),
            background_checkpoint: true,
        }
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Place the log, snapshot and checkpoint marker under one directory
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        let dir = path.into();
        self.config.log_path = dir.join(Config::WAL_FILENAME);
        self.config.snapshot_path = dir.join(Config::SNAPSHOT_FILENAME);
        self.config.checkpoint_path = dir.join(Config::CHECKPOINT_FILENAME);
        self
    }

    /// Set the log file location
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.log_path = path.into();
        self
    }

    /// Set the snapshot file location
    pub fn snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.snapshot_path = path.into();
        self
    }

    /// Set the checkpoint marker file location
    pub fn checkpoint_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.checkpoint_path = path.into();
        self
    }

    /// Set the WAL sync strategy
    pub fn wal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.wal_sync_strategy = strategy;
        self
    }

    /// Set the interval between background checkpoint cycles
    pub fn checkpoint_interval(mut self, interval: Duration) -> Self {
        self.config.checkpoint_interval = interval;
        self
    }

    /// Enable or disable the background checkpointer
    pub fn background_checkpoint(mut self, enabled: bool) -> Self {
        self.config.background_checkpoint = enabled;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
