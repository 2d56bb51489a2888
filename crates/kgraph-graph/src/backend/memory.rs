use std::sync::RwLock;

use serde_json::Value;

use super::{StorageBackend, Table, TableSet, WriteBatch};
use crate::error::StorageError;

/// In-memory backend. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: RwLock<TableSet>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, table: Table, key: &str) -> Result<Option<Value>, StorageError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| StorageError::LockPoisoned("memory backend"))?;
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
            .map_err(|_| StorageError::LockPoisoned("memory backend"))?;
        Ok(tables.scan_prefix(table, prefix))
    }

    fn last_key(&self, table: Table) -> Result<Option<String>, StorageError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| StorageError::LockPoisoned("memory backend"))?;
        Ok(tables.last_key(table))
    }

    fn apply(&self, batch: WriteBatch) -> Result<(), StorageError> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| StorageError::LockPoisoned("memory backend"))?;
        tables.apply(batch);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn put_get_delete() {
        let backend = MemoryBackend::new();
        let mut batch = WriteBatch::new();
        batch.put(Table::Nodes, "k1", json!({"title": "Graph"}));
        backend.apply(batch).unwrap();

        assert_eq!(
            backend.get(Table::Nodes, "k1").unwrap(),
            Some(json!({"title": "Graph"}))
        );

        let mut batch = WriteBatch::new();
        batch.delete(Table::Nodes, "k1");
        backend.apply(batch).unwrap();
        assert_eq!(backend.get(Table::Nodes, "k1").unwrap(), None);
    }

    #[test]
    fn deleting_absent_key_is_a_no_op() {
        let backend = MemoryBackend::new();
        let mut batch = WriteBatch::new();
        batch.delete(Table::Relationships, "missing");
        backend.apply(batch).unwrap();
        assert_eq!(backend.last_key(Table::Relationships).unwrap(), None);
    }
}
