//! Desired-state delta
//!
//! Folds a window of log records into one pending change per key, then
//! applies it onto a snapshot. Recovery and the checkpointer both go
//! through this, so replayed state matches checkpointed state exactly.

use std::collections::BTreeMap;

use crate::storage::Snapshot;
use crate::wal::{LogRecord, Operation};

/// Pending change for one key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeltaOp {
    /// Insert or overwrite the value
    Upsert(String),

    /// Remove the key if present
    Tombstone,
}

/// Last-write-wins fold of a window of records
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delta {
    /// key -> (sequence of the winning record, change)
    ops: BTreeMap<String, (u64, DeltaOp)>,
}

impl Delta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold `records` into a delta
    pub fn fold<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a LogRecord>,
    {
        let mut delta = Self::new();
        for record in records {
            delta.record(record);
        }
        delta
    }

    /// Fold one record in; a lower sequence never overrides a higher one
    pub fn record(&mut self, record: &LogRecord) {
        let (key, op) = match &record.operation {
            Operation::Put { key, value } => (key, DeltaOp::Upsert(value.clone())),
            Operation::Delete { key } => (key, DeltaOp::Tombstone),
        };

        match self.ops.get_mut(key) {
            Some(slot) if slot.0 > record.sequence => {}
            Some(slot) => *slot = (record.sequence, op),
            None => {
                self.ops.insert(key.clone(), (record.sequence, op));
            }
        }
    }

    /// Change recorded for `key`, if any
    pub fn get(&self, key: &str) -> Option<&DeltaOp> {
        self.ops.get(key).map(|(_, op)| op)
    }

    /// Number of keys touched
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Number of keys whose final change is a delete
    pub fn tombstones(&self) -> usize {
        self.ops
            .values()
            .filter(|(_, op)| *op == DeltaOp::Tombstone)
            .count()
    }

    /// Apply onto `snapshot`: tombstoned keys are removed, upserts written,
    /// keys outside the delta left untouched
    pub fn apply(&self, snapshot: &mut Snapshot) {
        for (key, (_, op)) in &self.ops {
            match op {
                DeltaOp::Upsert(value) => {
                    snapshot.insert(key.clone(), value.clone());
                }
                DeltaOp::Tombstone => {
                    snapshot.remove(key);
                }
            }
        }
    }
}
