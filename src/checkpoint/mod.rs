//! Checkpoint Module
//!
//! Background compaction of the log into the snapshot.
//!
//! ## Responsibilities
//! - Fold a bounded window of records (last write wins, deletes as tombstones)
//! - Merge the fold onto the current snapshot and replace it atomically
//! - Advance the checkpoint marker only after the snapshot is durable
//! - Run on a fixed interval with a promptly interruptible wait

mod checkpointer;
mod delta;

pub use checkpointer::{CheckpointHandle, CheckpointOutcome, CheckpointStats, Checkpointer};
pub use delta::{Delta, DeltaOp};
