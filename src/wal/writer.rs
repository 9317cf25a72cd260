//! WAL Writer
//!
//! Handles appending records to the WAL file.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::WalSyncStrategy;
use crate::error::{EmberError, Result};

use super::{LogRecord, Operation, WalRecovery};

/// Writes records to the WAL file
///
/// The writer owns the sequence counter. Callers share it behind a mutex,
/// which makes sequence assignment and the append one atomic step.
pub struct WalWriter {
    path: PathBuf,
    file: File,
    /// Length of the file after the last successful append
    len: u64,
    next_sequence: u64,
    sync_strategy: WalSyncStrategy,
    /// Appends written since the last fsync
    unsynced: usize,
    poisoned: bool,
}

impl WalWriter {
    /// Open or create a WAL file, resuming after its last valid record
    ///
    /// A torn trailing write is truncated first.
    pub fn open(path: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        let (_, result) = WalRecovery::recover(path)?;
        let next_sequence = result.last_sequence.map_or(0, |s| s + 1);
        Self::open_at(path, sync_strategy, next_sequence)
    }

    /// Open or create a WAL file with an explicit next sequence number
    ///
    /// The file must already be free of torn writes.
    pub fn open_at(path: &Path, sync_strategy: WalSyncStrategy, next_sequence: u64) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let len = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            file,
            len,
            next_sequence,
            sync_strategy,
            unsynced: 0,
            poisoned: false,
        })
    }

    /// Append a record to the WAL and return its sequence number
    ///
    /// The record is written to the OS before returning and fsynced
    /// according to the sync strategy. On failure the file is rolled back
    /// to its previous length and the sequence number is not consumed.
    pub fn append(&mut self, operation: Operation) -> Result<u64> {
        operation.validate()?;

        if self.poisoned {
            return Err(EmberError::WalPoisoned(self.path.display().to_string()));
        }

        let sequence = self.next_sequence;
        let line = LogRecord::new(sequence, operation).encode();

        if let Err(source) = self.write_line(line.as_bytes()) {
            self.rollback();
            return Err(EmberError::WalWrite { sequence, source });
        }

        self.len += line.len() as u64;
        self.next_sequence += 1;
        Ok(sequence)
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_data()?;
        self.unsynced = 0;
        Ok(())
    }

    /// Sequence number the next append will receive
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Highest sequence number handed out, `None` before the first append
    pub fn last_sequence(&self) -> Option<u64> {
        self.next_sequence.checked_sub(1)
    }

    /// Location of the WAL file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_line(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.file.write_all(bytes)?;
        self.file.flush()?;

        self.unsynced += 1;
        let due = match self.sync_strategy {
            WalSyncStrategy::EveryWrite => true,
            WalSyncStrategy::EveryNEntries { count } => self.unsynced >= count,
        };
        if due {
            self.file.sync_data()?;
            self.unsynced = 0;
        }
        Ok(())
    }

    /// Drop any partial bytes of a failed append
    fn rollback(&mut self) {
        let restored = self
            .file
            .set_len(self.len)
            .and_then(|_| self.file.sync_data());

        if let Err(e) = restored {
            tracing::error!(
                path = %self.path.display(),
                error = %e,
                "failed to roll back WAL after append error; refusing further appends"
            );
            self.poisoned = true;
        }
    }
}
