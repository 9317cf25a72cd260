//! Error types for EmberKV
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using EmberError
pub type Result<T> = std::result::Result<T, EmberError>;

/// Unified error type for EmberKV operations
#[derive(Debug, Error)]
pub enum EmberError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // WAL Errors
    // -------------------------------------------------------------------------
    /// The record with this sequence number was not made durable
    #[error("WAL append of sequence {sequence} failed: {source}")]
    WalWrite {
        sequence: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("WAL writer is unusable after a failed rollback: {0}")]
    WalPoisoned(String),

    // -------------------------------------------------------------------------
    // Format Errors
    // -------------------------------------------------------------------------
    /// A stored log or snapshot line could not be parsed
    #[error("Malformed {origin} entry at line {line}: {reason}")]
    MalformedRecord {
        origin: &'static str,
        line: u64,
        reason: String,
    },

    #[error("Checkpoint marker corrupted: {0}")]
    CheckpointCorruption(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Input Errors
    // -------------------------------------------------------------------------
    #[error("Invalid key {0:?}: keys must be non-empty and contain no whitespace")]
    InvalidKey(String),

    #[error("Invalid value {0:?}: values must not contain whitespace")]
    InvalidValue(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl EmberError {
    /// Whether this error describes an unparseable stored entry
    pub fn is_malformed(&self) -> bool {
        matches!(self, EmberError::MalformedRecord { .. })
    }
}
