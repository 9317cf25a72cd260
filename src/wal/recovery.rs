//! WAL Recovery
//!
//! Repairs the WAL after a crash so appends can resume safely.

use std::fs::OpenOptions;
use std::path::Path;

use crate::error::Result;

use super::{LogRecord, ReadStats, WalReader};

/// Handles WAL recovery after crash
pub struct WalRecovery;

/// Result of a recovery operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of records successfully recovered
    pub entries_recovered: u64,

    /// Number of malformed lines skipped
    pub entries_corrupted: u64,

    /// Last valid sequence number
    pub last_sequence: Option<u64>,

    /// Whether a torn trailing write was present
    pub was_truncated: bool,

    /// Size of the torn trailing write in bytes
    pub truncated_bytes: u64,
}

impl From<&ReadStats> for RecoveryResult {
    fn from(stats: &ReadStats) -> Self {
        Self {
            entries_recovered: stats.records_read,
            entries_corrupted: stats.malformed_skipped,
            last_sequence: stats.last_sequence,
            was_truncated: stats.torn_tail_bytes > 0,
            truncated_bytes: stats.torn_tail_bytes,
        }
    }
}

impl WalRecovery {
    /// Recover records from a WAL file
    ///
    /// This will:
    /// 1. Read all valid records
    /// 2. Skip malformed lines (with a warning)
    /// 3. Truncate a torn write at the end of the file
    /// 4. Return all valid records in file order
    pub fn recover(path: &Path) -> Result<(Vec<LogRecord>, RecoveryResult)> {
        let (records, stats) = WalReader::read_all(path)?;
        let result = RecoveryResult::from(&stats);

        if result.was_truncated {
            tracing::warn!(
                path = %path.display(),
                torn_bytes = stats.torn_tail_bytes,
                valid_len = stats.valid_len,
                "truncating torn write at end of WAL"
            );
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(stats.valid_len)?;
            file.sync_all()?;
        }

        Ok((records, result))
    }

    /// Verify integrity of a WAL file without modifying it
    pub fn verify(path: &Path) -> Result<RecoveryResult> {
        let (_, stats) = WalReader::read_all(path)?;
        Ok(RecoveryResult::from(&stats))
    }
}
