//! WAL Reader
//!
//! Handles reading records from the WAL file.
//!
//! Only newline-terminated lines count as records. An unterminated trailing
//! fragment is a torn write and ends the scan; a complete line that fails to
//! parse is skipped with a warning.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::error::{EmberError, Result};

use super::LogRecord;

/// Counters collected while scanning a WAL file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadStats {
    /// Records successfully parsed
    pub records_read: u64,

    /// Complete lines that could not be parsed
    pub malformed_skipped: u64,

    /// Bytes of the unterminated trailing fragment, if any
    pub torn_tail_bytes: u64,

    /// Byte length covered by complete lines
    pub valid_len: u64,

    /// Highest sequence number seen
    pub last_sequence: Option<u64>,
}

/// Reads records from the WAL file
pub struct WalReader {
    reader: BufReader<File>,
    line_no: u64,
    buf: Vec<u8>,
    stats: ReadStats,
}

impl WalReader {
    /// Open a WAL file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            line_no: 0,
            buf: Vec::new(),
            stats: ReadStats::default(),
        })
    }

    /// Read the next valid record, skipping malformed lines
    ///
    /// Returns `Ok(None)` at end of file or at a torn trailing fragment.
    pub fn next_record(&mut self) -> Result<Option<LogRecord>> {
        loop {
            self.buf.clear();
            let n = self.reader.read_until(b'\n', &mut self.buf)?;
            if n == 0 {
                return Ok(None);
            }

            if self.buf.last() != Some(&b'\n') {
                self.stats.torn_tail_bytes = n as u64;
                return Ok(None);
            }

            self.line_no += 1;
            self.stats.valid_len += n as u64;

            match self.parse_current() {
                Ok(record) => {
                    self.stats.records_read += 1;
                    self.stats.last_sequence = Some(match self.stats.last_sequence {
                        Some(prev) => prev.max(record.sequence),
                        None => record.sequence,
                    });
                    return Ok(Some(record));
                }
                Err(e) if e.is_malformed() => {
                    tracing::warn!(error = %e, "skipping malformed WAL line");
                    self.stats.malformed_skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Counters for everything read so far
    pub fn stats(&self) -> &ReadStats {
        &self.stats
    }

    /// Read every valid record of the file at `path`
    ///
    /// A missing file reads as empty.
    pub fn read_all(path: &Path) -> Result<(Vec<LogRecord>, ReadStats)> {
        let mut reader = match Self::open_existing(path)? {
            Some(reader) => reader,
            None => return Ok((Vec::new(), ReadStats::default())),
        };

        let mut records = Vec::new();
        while let Some(record) = reader.next_record()? {
            records.push(record);
        }
        Ok((records, reader.stats))
    }

    /// Read the records with sequence in `(after, upto]`, ascending
    ///
    /// `after == None` means the window starts at the first record.
    /// Scanning stops at the first record past `upto`; anything appended
    /// after the caller captured `upto` is left for a later window.
    pub fn read_window(
        path: &Path,
        after: Option<u64>,
        upto: u64,
    ) -> Result<(Vec<LogRecord>, ReadStats)> {
        let mut reader = match Self::open_existing(path)? {
            Some(reader) => reader,
            None => return Ok((Vec::new(), ReadStats::default())),
        };

        let mut records = Vec::new();
        while let Some(record) = reader.next_record()? {
            if record.sequence > upto {
                break;
            }
            if after.map_or(true, |a| record.sequence > a) {
                records.push(record);
            }
        }
        Ok((records, reader.stats))
    }

    fn open_existing(path: &Path) -> Result<Option<Self>> {
        match Self::open(path) {
            Ok(reader) => Ok(Some(reader)),
            Err(EmberError::Io(e)) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn parse_current(&self) -> Result<LogRecord> {
        let line = std::str::from_utf8(&self.buf[..self.buf.len() - 1]).map_err(|_| {
            EmberError::MalformedRecord {
                origin: "log",
                line: self.line_no,
                reason: "line is not valid UTF-8".to_string(),
            }
        })?;
        LogRecord::parse(line, self.line_no)
    }
}

impl Iterator for WalReader {
    type Item = Result<LogRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}
