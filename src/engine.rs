//! Engine Module
//!
//! The store facade that coordinates all components.
//!
//! ## Responsibilities
//! - Order every mutation through the WAL before the index sees it
//! - Serve reads from the in-memory index
//! - Run recovery on open and own the background checkpointer
//! - Stop the checkpointer and sync the log on close

use std::fs;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::checkpoint::{CheckpointHandle, CheckpointOutcome, Checkpointer};
use crate::config::Config;
use crate::error::Result;
use crate::index::InMemoryIndex;
use crate::recovery::{RecoveryLoader, RecoveryStats};
use crate::storage::{MarkerStore, SnapshotStore};
use crate::wal::{LogRecord, Operation, WalReader, WalWriter};

/// The main storage engine
///
/// ## Concurrency Model
///
/// - **Writes** (put/delete): Serialized by `write_lock`
///   - Must acquire: write_lock → WAL (append) → index (update)
///   - Holding `write_lock` across both steps keeps the index applying
///     mutations in sequence order
///
/// - **Reads** (get): Index read lock only
///   - Never wait on the checkpointer, which does not touch the index
///
/// - **Checkpointer**: Takes the WAL lock only long enough to read the
///   last sequence number, then works from the files
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Write-ahead log, shared with the checkpointer
    wal: Arc<Mutex<WalWriter>>,

    /// Current acknowledged state (internal RwLock)
    index: InMemoryIndex,

    /// Folds the log into the snapshot
    checkpointer: Arc<Checkpointer>,

    /// Background checkpoint loop, if enabled
    background: Option<CheckpointHandle>,

    /// Serializes write operations (put/delete)
    write_lock: Mutex<()>,

    /// What recovery found at open
    recovery_stats: RecoveryStats,
}

impl Engine {
    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Validate config, create parent directories
    /// 2. Recover: snapshot + unmerged log tail → index
    /// 3. Reopen the log for appends after the last sequence
    /// 4. Start the background checkpointer
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        for path in [&config.log_path, &config.snapshot_path, &config.checkpoint_path] {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
        }

        let recovered = RecoveryLoader::new(&config).load()?;

        let wal = WalWriter::open_at(
            &config.log_path,
            config.wal_sync_strategy,
            recovered.next_sequence,
        )?;
        let wal = Arc::new(Mutex::new(wal));

        let checkpointer = Arc::new(Checkpointer::new(
            Arc::clone(&wal),
            config.log_path.clone(),
            SnapshotStore::new(&config.snapshot_path),
            MarkerStore::new(&config.checkpoint_path),
            recovered.marker,
        ));

        let background = if config.background_checkpoint {
            Some(Arc::clone(&checkpointer).spawn(config.checkpoint_interval)?)
        } else {
            None
        };

        tracing::info!(
            log = %config.log_path.display(),
            keys = recovered.entries.len(),
            next_sequence = recovered.next_sequence,
            background_checkpoint = config.background_checkpoint,
            "engine opened"
        );

        Ok(Self {
            index: InMemoryIndex::from_map(recovered.entries),
            recovery_stats: recovered.stats,
            config,
            wal,
            checkpointer,
            background,
            write_lock: Mutex::new(()),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with all files under `path`
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::in_dir(path))
    }

    /// Get a value by key
    ///
    /// `None` means not found; a stored empty value is `Some("")`.
    pub fn get(&self, key: &str) -> Option<String> {
        self.index.get(key)
    }

    /// Put a key-value pair
    ///
    /// Returns once the record is in the log and the index updated.
    pub fn put(&self, key: &str, value: &str) -> Result<()> {
        let _write_guard = self.write_lock.lock();

        let sequence = self.wal.lock().append(Operation::Put {
            key: key.to_string(),
            value: value.to_string(),
        })?;

        self.index.put(key.to_string(), value.to_string());
        tracing::trace!(sequence, key, "put");
        Ok(())
    }

    /// Delete a key
    ///
    /// Deleting an absent key is not an error.
    pub fn delete(&self, key: &str) -> Result<()> {
        let _write_guard = self.write_lock.lock();

        let sequence = self.wal.lock().append(Operation::Delete {
            key: key.to_string(),
        })?;

        self.index.delete(key);
        tracing::trace!(sequence, key, "delete");
        Ok(())
    }

    /// Run one checkpoint cycle now
    ///
    /// Waits for an in-flight background cycle rather than overlapping it.
    pub fn checkpoint(&self) -> Result<CheckpointOutcome> {
        self.checkpointer.run_cycle()
    }

    /// Close the engine gracefully
    ///
    /// Stops the background checkpointer (waiting for an in-flight cycle)
    /// and syncs the WAL.
    pub fn close(mut self) -> Result<()> {
        if let Some(mut handle) = self.background.take() {
            handle.shutdown();
        }

        self.wal.lock().sync()?;
        tracing::info!("engine closed");
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Copy of every live entry in key order
    pub fn entries(&self) -> Vec<(String, String)> {
        self.index.entries()
    }

    /// Every valid record currently in the log
    pub fn log_records(&self) -> Result<Vec<LogRecord>> {
        WalReader::read_all(&self.config.log_path).map(|(records, _)| records)
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Highest sequence number appended so far
    pub fn last_sequence(&self) -> Option<u64> {
        self.wal.lock().last_sequence()
    }

    /// Last sequence folded into the snapshot
    pub fn checkpoint_marker(&self) -> Option<u64> {
        self.checkpointer.marker()
    }

    /// Whether the background checkpointer thread is alive
    pub fn is_checkpointer_running(&self) -> bool {
        self.background.as_ref().map_or(false, |h| h.is_running())
    }

    /// What recovery found when this engine was opened
    pub fn recovery_stats(&self) -> &RecoveryStats {
        &self.recovery_stats
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
