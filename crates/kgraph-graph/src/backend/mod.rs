//! Storage backends: the repository abstraction the stores are written
//! against.
//!
//! A backend holds named tables of string keys mapped to JSON values. Keys
//! within a table are kept in ascending order so prefix scans are ranged
//! lookups, and every [`WriteBatch`] is applied atomically with respect to
//! all other calls on the same backend.

mod file;
mod memory;

use std::collections::BTreeMap;
use std::ops::Bound;

use serde_json::Value;

pub use file::JsonFileBackend;
pub use memory::MemoryBackend;

use crate::error::StorageError;

/// The tables the graph stores use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Nodes,
    Relationships,
    RelationshipsByFrom,
    RelationshipsByTo,
    /// Per-table bookkeeping such as id high-water marks.
    Meta,
}

impl Table {
    pub const ALL: [Table; 5] = [
        Table::Nodes,
        Table::Relationships,
        Table::RelationshipsByFrom,
        Table::RelationshipsByTo,
        Table::Meta,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Nodes => "nodes",
            Table::Relationships => "relationships",
            Table::RelationshipsByFrom => "relationships_by_from",
            Table::RelationshipsByTo => "relationships_by_to",
            Table::Meta => "meta",
        }
    }

    pub fn from_name(name: &str) -> Option<Table> {
        Table::ALL.into_iter().find(|t| t.as_str() == name)
    }
}

/// A single staged write.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Put {
        table: Table,
        key: String,
        value: Value,
    },
    Delete {
        table: Table,
        key: String,
    },
}

/// An ordered group of writes applied all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, table: Table, key: impl Into<String>, value: Value) -> &mut Self {
        self.ops.push(WriteOp::Put {
            table,
            key: key.into(),
            value,
        });
        self
    }

    pub fn delete(&mut self, table: Table, key: impl Into<String>) -> &mut Self {
        self.ops.push(WriteOp::Delete {
            table,
            key: key.into(),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }
}

/// Trait for graph persistence backends.
///
/// Implementations must be safe to share across threads and must apply each
/// batch atomically: a concurrent reader observes either none or all of it.
pub trait StorageBackend: Send + Sync {
    /// Look up one value.
    fn get(&self, table: Table, key: &str) -> Result<Option<Value>, StorageError>;

    /// All entries whose key starts with `prefix`, in ascending key order.
    fn scan_prefix(&self, table: Table, prefix: &str)
        -> Result<Vec<(String, Value)>, StorageError>;

    /// The greatest key in `table`, if any.
    fn last_key(&self, table: Table) -> Result<Option<String>, StorageError>;

    /// Apply a batch of writes atomically.
    fn apply(&self, batch: WriteBatch) -> Result<(), StorageError>;
}

/// Ordered in-memory tables shared by the bundled backends.
#[derive(Debug, Clone, Default)]
pub(crate) struct TableSet {
    tables: BTreeMap<Table, BTreeMap<String, Value>>,
}

impl TableSet {
    pub(crate) fn get(&self, table: Table, key: &str) -> Option<Value> {
        self.tables.get(&table).and_then(|t| t.get(key)).cloned()
    }

    pub(crate) fn scan_prefix(&self, table: Table, prefix: &str) -> Vec<(String, Value)> {
        let Some(entries) = self.tables.get(&table) else {
            return Vec::new();
        };
        entries
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub(crate) fn last_key(&self, table: Table) -> Option<String> {
        self.tables
            .get(&table)
            .and_then(|t| t.keys().next_back())
            .cloned()
    }

    pub(crate) fn apply(&mut self, batch: WriteBatch) {
        for op in batch.ops {
            match op {
                WriteOp::Put { table, key, value } => {
                    self.tables.entry(table).or_default().insert(key, value);
                }
                WriteOp::Delete { table, key } => {
                    if let Some(entries) = self.tables.get_mut(&table) {
                        entries.remove(&key);
                    }
                }
            }
        }
    }

    pub(crate) fn to_snapshot(&self) -> BTreeMap<&'static str, &BTreeMap<String, Value>> {
        self.tables.iter().map(|(t, e)| (t.as_str(), e)).collect()
    }

    pub(crate) fn from_snapshot(
        snapshot: BTreeMap<String, BTreeMap<String, Value>>,
    ) -> Result<Self, StorageError> {
        let mut tables = BTreeMap::new();
        for (name, entries) in snapshot {
            let table = Table::from_name(&name).ok_or_else(|| StorageError::Corrupt {
                table: "snapshot",
                key: name.clone(),
            })?;
            tables.insert(table, entries);
        }
        Ok(Self { tables })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scan_prefix_is_ordered_and_bounded() {
        let mut set = TableSet::default();
        let mut batch = WriteBatch::new();
        batch
            .put(Table::RelationshipsByFrom, "01/03", Value::Null)
            .put(Table::RelationshipsByFrom, "01/01", Value::Null)
            .put(Table::RelationshipsByFrom, "02/02", Value::Null)
            .put(Table::RelationshipsByFrom, "0", Value::Null);
        set.apply(batch);

        let keys: Vec<String> = set
            .scan_prefix(Table::RelationshipsByFrom, "01/")
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["01/01", "01/03"]);
        assert!(set.scan_prefix(Table::RelationshipsByTo, "01/").is_empty());
    }

    #[test]
    fn batch_applies_in_order() {
        let mut set = TableSet::default();
        let mut batch = WriteBatch::new();
        batch
            .put(Table::Nodes, "a", json!(1))
            .delete(Table::Nodes, "a")
            .put(Table::Nodes, "b", json!(2));
        assert_eq!(batch.len(), 3);
        set.apply(batch);

        assert_eq!(set.get(Table::Nodes, "a"), None);
        assert_eq!(set.get(Table::Nodes, "b"), Some(json!(2)));
        assert_eq!(set.last_key(Table::Nodes), Some("b".to_string()));
    }

    #[test]
    fn table_names_round_trip() {
        for table in Table::ALL {
            assert_eq!(Table::from_name(table.as_str()), Some(table));
        }
        assert_eq!(Table::from_name("edges"), None);
    }
}
