use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde_json::Value;

use super::{StorageBackend, Table, TableSet, WriteBatch};
use crate::error::StorageError;

/// File-system backed store.
///
/// Keeps all tables in memory and rewrites a JSON snapshot after every
/// committed batch:
/// ```text
/// {
///   "nodes": { "00000000000000000001": { ... } },
///   "relationships": { ... },
///   "relationships_by_from": { "00000000000000000001/00000000000000000001": null },
///   "relationships_by_to": { ... }
/// }
/// ```
/// The snapshot is written to a sibling `.tmp` file, flushed to disk with
/// `sync_all`, and only then renamed into place, so a crash mid-write leaves
/// the previous snapshot intact. A batch whose snapshot cannot be written is
/// not applied.
///
/// Every batch clones the tables and rewrites the whole snapshot, so one
/// write costs O(total records) and bulk loads grow quadratically. Suited to
/// small graphs; large ones want a log-structured backend behind the same
/// trait.
#[derive(Debug)]
pub struct JsonFileBackend {
    path: PathBuf,
    tables: RwLock<TableSet>,
}

impl JsonFileBackend {
    /// Open the snapshot at `path`, or start empty if it does not exist.
    /// Creates the parent directory if needed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tables = if path.exists() {
            let raw = fs::read(&path)?;
            let snapshot: BTreeMap<String, BTreeMap<String, Value>> = serde_json::from_slice(&raw)?;
            TableSet::from_snapshot(snapshot)?
        } else {
            TableSet::default()
        };

        tracing::debug!(path = %path.display(), "Opened file backend");
        Ok(Self {
            path,
            tables: RwLock::new(tables),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, tables: &TableSet) -> Result<(), StorageError> {
        let json = serde_json::to_vec(&tables.to_snapshot())?;
        let tmp = tmp_path(&self.path);

        let mut file = File::create(&tmp)?;
        file.write_all(&json)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("kgraph-data"));
    name.push(".tmp");
    path.with_file_name(name)
}

impl StorageBackend for JsonFileBackend {
    fn get(&self, table: Table, key: &str) -> Result<Option<Value>, StorageError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| StorageError::LockPoisoned("file backend"))?;
        Ok(tables.get(table, key))
    }

    fn scan_prefix(
        &self,
        table: Table,
        prefix: &str,
    ) -> Result<Vec<(String, Value)>, StorageError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| StorageError::LockPoisoned("file backend"))?;
        Ok(tables.scan_prefix(table, prefix))
    }

    fn last_key(&self, table: Table) -> Result<Option<String>, StorageError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| StorageError::LockPoisoned("file backend"))?;
        Ok(tables.last_key(table))
    }

    fn apply(&self, batch: WriteBatch) -> Result<(), StorageError> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| StorageError::LockPoisoned("file backend"))?;

        let mut next = tables.clone();
        next.apply(batch);
        self.persist(&next)?;
        *tables = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");

        {
            let backend = JsonFileBackend::open(&path).unwrap();
            let mut batch = WriteBatch::new();
            batch
                .put(Table::Nodes, "00000000000000000001", json!({"title": "A"}))
                .put(Table::RelationshipsByFrom, "x/y", Value::Null);
            backend.apply(batch).unwrap();
        }

        let reopened = JsonFileBackend::open(&path).unwrap();
        assert_eq!(
            reopened.get(Table::Nodes, "00000000000000000001").unwrap(),
            Some(json!({"title": "A"}))
        );
        assert_eq!(reopened.scan_prefix(Table::RelationshipsByFrom, "x/").unwrap().len(), 1);
        assert!(!tmp_path(&path).exists());
    }

    #[test]
    fn creates_missing_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/graph.json");
        let backend = JsonFileBackend::open(&path).unwrap();

        let mut batch = WriteBatch::new();
        batch.put(Table::Nodes, "k", json!(1));
        backend.apply(batch).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn unwritable_snapshot_leaves_batch_unapplied() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        let backend = JsonFileBackend::open(&path).unwrap();

        let mut batch = WriteBatch::new();
        batch.put(Table::Nodes, "00000000000000000001", json!({"title": "A"}));
        backend.apply(batch).unwrap();

        // A directory squatting on the temp path makes the snapshot write fail.
        fs::create_dir(tmp_path(&path)).unwrap();

        let mut batch = WriteBatch::new();
        batch
            .put(Table::Nodes, "00000000000000000002", json!({"title": "B"}))
            .delete(Table::Nodes, "00000000000000000001");
        assert!(matches!(backend.apply(batch), Err(StorageError::Io(_))));

        assert!(backend.get(Table::Nodes, "00000000000000000001").unwrap().is_some());
        assert!(backend.get(Table::Nodes, "00000000000000000002").unwrap().is_none());

        fs::remove_dir(tmp_path(&path)).unwrap();
        let reopened = JsonFileBackend::open(&path).unwrap();
        assert_eq!(reopened.scan_prefix(Table::Nodes, "").unwrap().len(), 1);
    }

    #[test]
    fn snapshot_is_compact_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        let backend = JsonFileBackend::open(&path).unwrap();

        let mut batch = WriteBatch::new();
        batch.put(Table::Nodes, "k", json!({"title": "A"}));
        backend.apply(batch).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(!raw.contains('\n'));
    }

    #[test]
    fn corrupt_snapshot_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        fs::write(&path, b"{ not json").unwrap();

        let result = JsonFileBackend::open(&path);
        assert!(matches!(result, Err(StorageError::Serialization(_))));
    }

    #[test]
    fn unknown_table_in_snapshot_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        fs::write(&path, br#"{"edges": {}}"#).unwrap();

        let result = JsonFileBackend::open(&path);
        assert!(matches!(result, Err(StorageError::Corrupt { .. })));
    }
}
