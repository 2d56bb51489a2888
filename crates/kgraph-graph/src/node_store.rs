//! Node record storage.

use std::sync::Arc;

use kgraph_core::{Node, NodeId};

use crate::backend::{StorageBackend, Table, WriteBatch};
use crate::error::{GraphResult, StorageError};
use crate::id_gen::IdSequence;
use crate::keys;

/// Keyed storage for node records.
///
/// Does no validation: title rules and not-found reporting belong to
/// [`crate::GraphMutationService`].
pub struct NodeStore {
    backend: Arc<dyn StorageBackend>,
    ids: IdSequence,
}

impl NodeStore {
    /// Open over `backend`, resuming the id sequence from stored records.
    pub fn open(backend: Arc<dyn StorageBackend>) -> GraphResult<Self> {
        let ids = IdSequence::resume(backend.as_ref(), Table::Nodes)?;
        Ok(Self { backend, ids })
    }

    /// Assign a fresh id, store the record, and return it.
    pub fn create(&self, title: &str, description: Option<&str>) -> GraphResult<Node> {
        let node = Node {
            id: NodeId(self.ids.next_id()),
            title: title.to_string(),
            description: description.map(str::to_string),
        };

        let mut batch = WriteBatch::new();
        batch.put(Table::Nodes, keys::node_key(node.id), serde_json::to_value(&node)?);
        self.ids.stage_issued(node.id.0, &mut batch);
        self.backend.apply(batch)?;

        tracing::debug!(node_id = %node.id, "Node stored");
        Ok(node)
    }

    pub fn get(&self, id: NodeId) -> GraphResult<Option<Node>> {
        match self.backend.get(Table::Nodes, &keys::node_key(id))? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub fn exists(&self, id: NodeId) -> GraphResult<bool> {
        Ok(self.backend.get(Table::Nodes, &keys::node_key(id))?.is_some())
    }

    /// Every node, in insertion order.
    pub fn all(&self) -> GraphResult<Vec<Node>> {
        self.backend
            .scan_prefix(Table::Nodes, "")?
            .into_iter()
            .map(|(key, value)| {
                serde_json::from_value(value).map_err(|_| {
                    StorageError::Corrupt {
                        table: Table::Nodes.as_str(),
                        key,
                    }
                    .into()
                })
            })
            .collect()
    }

    pub fn count(&self) -> GraphResult<usize> {
        Ok(self.backend.scan_prefix(Table::Nodes, "")?.len())
    }

    /// Case-insensitive substring match over titles, in insertion order.
    ///
    /// The empty query matches every titled node. Nodes with an empty title
    /// never match.
    pub fn search_by_title_substring(&self, query: &str) -> GraphResult<Vec<Node>> {
        let needle = query.to_lowercase();
        let matches = self
            .all()?
            .into_iter()
            .filter(|node| !node.title.is_empty() && node.title.to_lowercase().contains(&needle))
            .collect();
        Ok(matches)
    }

    /// Remove the record. Returns whether it existed.
    pub fn delete(&self, id: NodeId) -> GraphResult<bool> {
        if !self.exists(id)? {
            return Ok(false);
        }
        let mut batch = WriteBatch::new();
        self.stage_delete(id, &mut batch);
        self.backend.apply(batch)?;
        Ok(true)
    }

    /// Add the deletion of `id` to a batch without applying it.
    pub fn stage_delete(&self, id: NodeId, batch: &mut WriteBatch) {
        batch.delete(Table::Nodes, keys::node_key(id));
    }
}
