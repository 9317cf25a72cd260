//! Checkpoint marker persistence
//!
//! Records the last sequence number fully folded into the snapshot.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{EmberError, Result};

use super::atomic::{cleanup_temp_file, write_atomic};

/// CRC (4) + Len (4)
const HEADER_SIZE: usize = 8;

/// Persisted checkpoint marker
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointMeta {
    /// Last sequence folded into the snapshot; `None` before the first checkpoint
    pub last_sequence: Option<u64>,

    /// Number of keys in the snapshot written by that checkpoint
    pub snapshot_entries: u64,

    /// Unix millis when the marker was written
    pub created_at_ms: u64,
}

impl CheckpointMeta {
    pub fn new(last_sequence: Option<u64>, snapshot_entries: u64) -> Self {
        let created_at_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        Self {
            last_sequence,
            snapshot_entries,
            created_at_ms,
        }
    }

    /// Serialize as `[CRC32][Len][bincode payload]`
    pub fn encode(&self) -> Result<Vec<u8>> {
        let payload =
            bincode::serialize(self).map_err(|e| EmberError::Serialization(e.to_string()))?;

        let mut bytes = Vec::with_capacity(HEADER_SIZE + payload.len());
        bytes.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
        bytes.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&payload);
        Ok(bytes)
    }

    /// Decode bytes produced by `encode`, verifying the checksum
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(EmberError::CheckpointCorruption(format!(
                "file too short: {} bytes",
                bytes.len()
            )));
        }

        let crc = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let len = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;

        let payload = &bytes[HEADER_SIZE..];
        if payload.len() != len {
            return Err(EmberError::CheckpointCorruption(format!(
                "length mismatch: header says {}, found {}",
                len,
                payload.len()
            )));
        }

        let actual = crc32fast::hash(payload);
        if actual != crc {
            return Err(EmberError::CheckpointCorruption(format!(
                "CRC mismatch: expected {:#010x}, got {:#010x}",
                crc, actual
            )));
        }

        bincode::deserialize(payload).map_err(|e| EmberError::CheckpointCorruption(e.to_string()))
    }
}

/// Reads and atomically replaces the checkpoint marker file
#[derive(Debug, Clone)]
pub struct MarkerStore {
    path: PathBuf,
}

impl MarkerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the marker; a missing file means nothing has been checkpointed
    pub fn load(&self) -> Result<CheckpointMeta> {
        match fs::read(&self.path) {
            Ok(bytes) => CheckpointMeta::decode(&bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(CheckpointMeta::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Durably replace the marker
    pub fn store(&self, meta: &CheckpointMeta) -> Result<()> {
        write_atomic(&self.path, &meta.encode()?)?;
        Ok(())
    }

    /// Remove the temporary file of an interrupted store
    pub fn cleanup_temp_files(&self) -> Result<bool> {
        Ok(cleanup_temp_file(&self.path)?)
    }
}
