//! Recovery Loader
//!
//! Rebuilds the in-memory state at startup from the snapshot plus every
//! log record the snapshot does not cover yet.
//!
//! The replay of the unmerged tail is what keeps acknowledged writes alive
//! across a restart: anything appended after the last checkpoint exists
//! only in the log.

use crate::checkpoint::Delta;
use crate::config::Config;
use crate::error::Result;
use crate::storage::{MarkerStore, Snapshot, SnapshotStore};
use crate::wal::{RecoveryResult, WalRecovery};

/// Counters describing one startup recovery
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryStats {
    /// Keys loaded from the snapshot file
    pub snapshot_entries: usize,

    /// Snapshot lines skipped as malformed
    pub snapshot_malformed: u64,

    /// Checkpoint marker found on disk
    pub marker: Option<u64>,

    /// The marker file existed but could not be decoded
    pub marker_corrupted: bool,

    /// Result of scanning (and repairing) the log
    pub log: RecoveryResult,

    /// Log records applied on top of the snapshot
    pub replayed: usize,
}

/// State handed to the engine after recovery
#[derive(Debug, Clone)]
pub struct RecoveredState {
    /// Initial contents of the in-memory index
    pub entries: Snapshot,

    /// Checkpoint marker to resume from
    pub marker: Option<u64>,

    /// Sequence number for the next append
    pub next_sequence: u64,

    pub stats: RecoveryStats,
}

/// Composes snapshot + log tail into the initial index
pub struct RecoveryLoader<'a> {
    config: &'a Config,
}

impl<'a> RecoveryLoader<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Run recovery
    ///
    /// 1. Remove temp files left by an interrupted checkpoint
    /// 2. Load the checkpoint marker (a corrupt marker means "replay all")
    /// 3. Load the snapshot
    /// 4. Repair the log and collect its records
    /// 5. Fold every record past the marker onto the snapshot
    pub fn load(&self) -> Result<RecoveredState> {
        let snapshot_store = SnapshotStore::new(&self.config.snapshot_path);
        let marker_store = MarkerStore::new(&self.config.checkpoint_path);

        snapshot_store.cleanup_temp_files()?;
        marker_store.cleanup_temp_files()?;

        let mut stats = RecoveryStats::default();

        // Replaying the whole log over any checkpointed snapshot yields the
        // same state, so losing the marker only costs replay time.
        let marker = match marker_store.load() {
            Ok(meta) => meta.last_sequence,
            Err(e) => {
                tracing::warn!(
                    path = %marker_store.path().display(),
                    error = %e,
                    "ignoring unreadable checkpoint marker, replaying the full log"
                );
                stats.marker_corrupted = true;
                None
            }
        };
        stats.marker = marker;

        let (mut entries, snapshot_malformed) = snapshot_store.load_counting()?;
        stats.snapshot_entries = entries.len();
        stats.snapshot_malformed = snapshot_malformed;

        let (records, log_result) = WalRecovery::recover(&self.config.log_path)?;

        let tail: Vec<_> = records
            .iter()
            .filter(|r| marker.map_or(true, |m| r.sequence > m))
            .collect();
        Delta::fold(tail.iter().copied()).apply(&mut entries);
        stats.replayed = tail.len();

        let last_sequence = match (log_result.last_sequence, marker) {
            (Some(l), Some(m)) if m > l => {
                tracing::warn!(
                    log_last = l,
                    marker = m,
                    "checkpoint marker is ahead of the log; resuming after the marker"
                );
                Some(m)
            }
            (Some(l), _) => Some(l),
            (None, m) => m,
        };
        stats.log = log_result;

        tracing::info!(
            snapshot_entries = stats.snapshot_entries,
            marker = ?stats.marker,
            log_records = stats.log.entries_recovered,
            replayed = stats.replayed,
            malformed = stats.log.entries_corrupted + stats.snapshot_malformed,
            truncated = stats.log.was_truncated,
            "recovery complete"
        );

        Ok(RecoveredState {
            entries,
            marker,
            next_sequence: last_sequence.map_or(0, |s| s + 1),
            stats,
        })
    }
}
