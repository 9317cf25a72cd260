//! Storage Module
//!
//! Persistent consolidated state: the snapshot file and the checkpoint
//! marker that says how much of the log the snapshot covers.
//!
//! ## Responsibilities
//! - Load the snapshot (tolerating malformed lines)
//! - Replace the snapshot atomically (never visible half-written)
//! - Persist the checkpoint marker with a checksum
//!
//! ## Snapshot Format
//! ```text
//! ┌────────────────────────────────────────┐
//! │ <key> <value>\n                        │
//! │ ... one line per key, sorted by key    │
//! └────────────────────────────────────────┘
//! ```
//!
//! ## Marker Format
//! ```text
//! ┌─────────┬─────────┬──────────────────────────┐
//! │ CRC (4) │ Len (4) │ bincode(CheckpointMeta)  │
//! └─────────┴─────────┴──────────────────────────┘
//! ```
//!
//! Both files are written as `<name>.tmp`, fsynced, renamed into place and
//! the parent directory fsynced.

mod atomic;
mod marker;
mod snapshot;

pub use atomic::{cleanup_temp_file, temp_path, write_atomic};
pub use marker::{CheckpointMeta, MarkerStore};
pub use snapshot::{Snapshot, SnapshotStore};
