//! Write-Ahead Log (WAL) Module
//!
//! Provides durability guarantees through append-only logging.
//!
//! ## Responsibilities
//! - Append a record before any mutation reaches the index
//! - Sequence numbers for ordering (0, 1, 2, ...)
//! - Tolerate malformed lines and torn trailing writes
//! - Windowed reads for the checkpointer, full replay for recovery
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ 0 PUT k1 x\n                            │
//! │ 1 PUT k2 y\n                            │
//! │ 2 DELETE k1\n                           │
//! │ ...                                     │
//! └─────────────────────────────────────────┘
//! ```
//! Fields are separated by a single space; keys and values never contain
//! whitespace. A line without its trailing newline is a torn write.

mod entry;
mod writer;
mod reader;
mod recovery;

pub use entry::{validate_key, validate_value, LogRecord, Operation, DELIMITER};
pub use writer::WalWriter;
pub use reader::{ReadStats, WalReader};
pub use recovery::{WalRecovery, RecoveryResult};
