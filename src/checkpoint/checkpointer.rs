//! Checkpointer
//!
//! Periodically folds the unmerged tail of the log into the snapshot.
//!
//! ## Cycle
//! 1. Capture `H` (last appended sequence) and `C` (checkpoint marker)
//! 2. Read records in `(C, H]`
//! 3. Fold them into a last-write-wins delta
//! 4. Load the snapshot, apply the delta
//! 5. Atomically replace the snapshot
//! 6. Persist the marker as `H` (always the last durable step)
//!
//! A crash between 5 and 6 leaves the old marker in place; the next cycle
//! reapplies the same delta onto the new snapshot with the same result.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, RecvTimeoutError, Sender};
use parking_lot::{Mutex, RwLock};

use crate::error::Result;
use crate::storage::{CheckpointMeta, MarkerStore, SnapshotStore};
use crate::wal::{WalReader, WalWriter};

use super::Delta;

/// What one checkpoint cycle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckpointOutcome {
    /// Nothing new in the log since the last checkpoint
    Skipped {
        high_water: Option<u64>,
        marker: Option<u64>,
    },

    /// The snapshot was rewritten and the marker advanced
    Completed(CheckpointStats),
}

impl CheckpointOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, CheckpointOutcome::Completed(_))
    }
}

/// Counters for a completed cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointStats {
    /// Marker before the cycle (exclusive window start)
    pub previous_marker: Option<u64>,

    /// Marker after the cycle (inclusive window end)
    pub high_water: u64,

    /// Records read from the window
    pub records_folded: usize,

    /// Distinct keys touched by the window
    pub keys_touched: usize,

    /// Keys whose final change was a delete
    pub tombstones: usize,

    /// Malformed log lines skipped while reading the window
    pub malformed_skipped: u64,

    /// Keys in the new snapshot
    pub snapshot_entries: usize,
}

/// Folds log windows into the snapshot
pub struct Checkpointer {
    /// Shared with the engine; locked only to read the high-water mark
    wal: Arc<Mutex<WalWriter>>,

    log_path: PathBuf,
    snapshot: SnapshotStore,
    marker_store: MarkerStore,

    /// Held for a whole cycle, so cycles never overlap
    cycle_lock: Mutex<()>,

    /// Last sequence folded into the snapshot, published after each cycle
    marker: RwLock<Option<u64>>,
}

impl Checkpointer {
    pub fn new(
        wal: Arc<Mutex<WalWriter>>,
        log_path: impl Into<PathBuf>,
        snapshot: SnapshotStore,
        marker_store: MarkerStore,
        marker: Option<u64>,
    ) -> Self {
        Self {
            wal,
            log_path: log_path.into(),
            snapshot,
            marker_store,
            cycle_lock: Mutex::new(()),
            marker: RwLock::new(marker),
        }
    }

    /// Last sequence folded into the snapshot
    pub fn marker(&self) -> Option<u64> {
        *self.marker.read()
    }

    /// Run one checkpoint cycle
    pub fn run_cycle(&self) -> Result<CheckpointOutcome> {
        let _cycle = self.cycle_lock.lock();
        // Only this cycle writes the marker while `_cycle` is held.
        let marker = self.marker();

        // Anything appended after this read belongs to the next cycle.
        let high_water = self.wal.lock().last_sequence();

        let high = match high_water {
            Some(h) if marker.map_or(true, |c| h > c) => h,
            _ => {
                tracing::debug!(?high_water, ?marker, "no new records to checkpoint");
                return Ok(CheckpointOutcome::Skipped { high_water, marker });
            }
        };

        let (records, read_stats) = WalReader::read_window(&self.log_path, marker, high)?;
        let delta = Delta::fold(&records);

        let mut snapshot = self.snapshot.load()?;
        delta.apply(&mut snapshot);
        self.snapshot.replace(&snapshot)?;

        self.marker_store
            .store(&CheckpointMeta::new(Some(high), snapshot.len() as u64))?;

        let stats = CheckpointStats {
            previous_marker: marker,
            high_water: high,
            records_folded: records.len(),
            keys_touched: delta.len(),
            tombstones: delta.tombstones(),
            malformed_skipped: read_stats.malformed_skipped,
            snapshot_entries: snapshot.len(),
        };
        *self.marker.write() = Some(high);

        tracing::info!(
            previous_marker = ?stats.previous_marker,
            high_water = stats.high_water,
            records = stats.records_folded,
            keys = stats.keys_touched,
            tombstones = stats.tombstones,
            snapshot_entries = stats.snapshot_entries,
            "checkpoint complete"
        );

        Ok(CheckpointOutcome::Completed(stats))
    }

    /// Start the background loop, one cycle per `interval`
    pub fn spawn(self: Arc<Self>, interval: Duration) -> Result<CheckpointHandle> {
        let (shutdown_tx, shutdown_rx) = channel::bounded::<()>(1);

        let thread = thread::Builder::new()
            .name("emberkv-checkpointer".to_string())
            .spawn(move || {
                tracing::debug!(?interval, "checkpointer started");
                loop {
                    match shutdown_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            if let Err(e) = self.run_cycle() {
                                tracing::error!(error = %e, "checkpoint cycle failed");
                            }
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                tracing::debug!("checkpointer stopped");
            })?;

        Ok(CheckpointHandle {
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        })
    }
}

/// Owner's handle on the background loop
///
/// Dropping the handle stops the loop and waits for it.
pub struct CheckpointHandle {
    shutdown: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl CheckpointHandle {
    /// Signal the loop to stop and wait for the in-flight cycle to finish
    pub fn shutdown(&mut self) {
        // Disconnecting wakes the loop out of its wait immediately.
        drop(self.shutdown.take());

        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("checkpointer thread panicked");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().map_or(false, |t| !t.is_finished())
    }
}

impl Drop for CheckpointHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
