//! Snapshot Store
//!
//! One consolidated file holding the full key/value state as of the
//! checkpoint marker.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::{EmberError, Result};
use crate::wal::{validate_key, validate_value, DELIMITER};

use super::atomic::{cleanup_temp_file, write_atomic};

/// Full key/value state; ordered so equal states serialize identically
pub type Snapshot = BTreeMap<String, String>;

/// Reads and atomically replaces the snapshot file
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the snapshot file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted snapshot
    ///
    /// A missing file is an empty snapshot. Lines that cannot be parsed
    /// are skipped with a warning.
    pub fn load(&self) -> Result<Snapshot> {
        self.load_counting().map(|(snapshot, _)| snapshot)
    }

    /// Load the snapshot and report how many lines were skipped
    pub fn load_counting(&self) -> Result<(Snapshot, u64)> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok((Snapshot::new(), 0)),
            Err(e) => return Err(e.into()),
        };

        let mut reader = BufReader::new(file);
        let mut snapshot = Snapshot::new();
        let mut skipped = 0;
        let mut line_no = 0;
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            line_no += 1;

            let line = buf.strip_suffix(b"\n").unwrap_or(&buf[..]);
            if line.is_empty() {
                continue;
            }

            match parse_line(line, line_no) {
                Ok((key, value)) => {
                    snapshot.insert(key, value);
                }
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), error = %e, "skipping malformed snapshot line");
                    skipped += 1;
                }
            }
        }

        Ok((snapshot, skipped))
    }

    /// Atomically replace the persisted snapshot with `snapshot`
    pub fn replace(&self, snapshot: &Snapshot) -> Result<()> {
        let mut out = String::new();
        for (key, value) in snapshot {
            validate_key(key)?;
            validate_value(value)?;
            out.push_str(key);
            out.push(DELIMITER);
            out.push_str(value);
            out.push('\n');
        }

        write_atomic(&self.path, out.as_bytes())?;
        Ok(())
    }

    /// Remove the temporary file of an interrupted replace
    pub fn cleanup_temp_files(&self) -> Result<bool> {
        Ok(cleanup_temp_file(&self.path)?)
    }
}

fn parse_line(line: &[u8], line_no: u64) -> Result<(String, String)> {
    let malformed = |reason: &str| EmberError::MalformedRecord {
        origin: "snapshot",
        line: line_no,
        reason: reason.to_string(),
    };

    let line = std::str::from_utf8(line).map_err(|_| malformed("line is not valid UTF-8"))?;
    let (key, value) = line
        .split_once(DELIMITER)
        .ok_or_else(|| malformed("missing delimiter between key and value"))?;

    if key.is_empty() {
        return Err(malformed("empty key"));
    }
    if key.chars().any(char::is_whitespace) {
        return Err(malformed("key contains whitespace"));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(malformed("value contains a delimiter"));
    }

    Ok((key.to_string(), value.to_string()))
}
