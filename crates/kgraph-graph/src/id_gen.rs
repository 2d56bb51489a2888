use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;

use crate::backend::{StorageBackend, Table, WriteBatch};
use crate::error::StorageError;
use crate::keys;

/// A monotonic id sequence for one record table. Ids start at 1.
///
/// Every create stages the issued id as the table's high-water mark in
/// [`Table::Meta`], in the same batch as the record. Reopening resumes past
/// that mark, so an id freed by a deletion is never handed out again.
#[derive(Debug)]
pub struct IdSequence {
    table: Table,
    next: AtomicU64,
}

impl IdSequence {
    pub fn new(table: Table) -> Self {
        Self::starting_at(table, 1)
    }

    pub fn starting_at(table: Table, first: u64) -> Self {
        Self {
            table,
            next: AtomicU64::new(first.max(1)),
        }
    }

    /// Resume after the stored high-water mark, or after the greatest key in
    /// the table when no mark exists yet (snapshots written before marks
    /// were recorded). The larger of the two wins.
    pub fn resume(backend: &dyn StorageBackend, table: Table) -> Result<Self, StorageError> {
        let last_key = match backend.last_key(table)? {
            Some(key) => keys::decode_id(&key).ok_or(StorageError::Corrupt {
                table: table.as_str(),
                key,
            })?,
            None => 0,
        };
        let mark = match backend.get(Table::Meta, table.as_str())? {
            Some(value) => value.as_u64().ok_or_else(|| StorageError::Corrupt {
                table: Table::Meta.as_str(),
                key: table.as_str().to_string(),
            })?,
            None => 0,
        };
        Ok(Self::starting_at(table, last_key.max(mark) + 1))
    }

    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Record `id` as issued. Callers serialize creates, so marks are
    /// written in increasing order.
    pub fn stage_issued(&self, id: u64, batch: &mut WriteBatch) {
        batch.put(Table::Meta, self.table.as_str(), Value::from(id));
    }
}
