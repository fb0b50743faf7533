//! Index-addressed storage for the records of one batch.
//!
//! Tasks refer to records by index; every read or rewrite goes through
//! [`RecordArena::lock`], which guards a single record. Writes to different
//! fields of the same record are serialised by that lock and never lose one
//! another.

use std::sync::{Mutex, MutexGuard};

use crate::models::Record;

#[derive(Debug, Default)]
pub struct RecordArena {
    records: Vec<Mutex<Record>>,
}

impl RecordArena {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records: records.into_iter().map(Mutex::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Locks the record at `index`, recovering from poison if necessary.
    ///
    /// Returns `None` for an index outside the batch.
    pub fn lock(&self, index: usize) -> Option<MutexGuard<'_, Record>> {
        self.records.get(index).map(|slot| {
            slot.lock().unwrap_or_else(|poisoned| {
                tracing::warn!(record = index, "Recovered from poisoned record lock");
                poisoned.into_inner()
            })
        })
    }

    /// Releases the records back to the caller, in their original order.
    pub fn into_records(self) -> Vec<Record> {
        self.records
            .into_iter()
            .map(|slot| slot.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner()))
            .collect()
    }
}
