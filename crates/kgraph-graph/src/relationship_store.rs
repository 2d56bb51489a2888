//! Relationship storage with forward and reverse indexes.
//!
//! Each relationship is written as three entries in one atomic batch (plus
//! the id high-water mark):
//! - the record in `relationships`
//! - `{from}/{id}` in `relationships_by_from` (outgoing lookups)
//! - `{to}/{id}` in `relationships_by_to` (incoming lookups)
//!
//! Deletion removes all three in one batch, so the indexes and the record
//! table are never observed out of step.

use std::sync::Arc;

use kgraph_core::{NodeId, Relationship, RelationshipId, RelationshipType};

use crate::backend::{StorageBackend, Table, WriteBatch};
use crate::error::GraphResult;
use crate::id_gen::IdSequence;
use crate::keys;

/// Keyed storage for relationship records.
///
/// Does not check that endpoints exist; that is the caller's job
/// (see [`crate::GraphMutationService::link_nodes`]).
pub struct RelationshipStore {
    backend: Arc<dyn StorageBackend>,
    ids: IdSequence,
}

impl RelationshipStore {
    /// Open over `backend`, resuming the id sequence from stored records.
    pub fn open(backend: Arc<dyn StorageBackend>) -> GraphResult<Self> {
        let ids = IdSequence::resume(backend.as_ref(), Table::Relationships)?;
        Ok(Self { backend, ids })
    }

    /// Assign a fresh id and store the record with both index entries.
    pub fn create(
        &self,
        relationship_type: RelationshipType,
        notes: Option<&str>,
        from_node_id: NodeId,
        to_node_id: NodeId,
    ) -> GraphResult<Relationship> {
        let relationship = Relationship {
            id: RelationshipId(self.ids.next_id()),
            relationship_type,
            notes: notes.map(str::to_string),
            from_node_id,
            to_node_id,
        };

        let mut batch = WriteBatch::new();
        batch
            .put(
                Table::Relationships,
                keys::relationship_key(relationship.id),
                serde_json::to_value(&relationship)?,
            )
            .put(
                Table::RelationshipsByFrom,
                keys::index_key(from_node_id, relationship.id),
                serde_json::Value::Null,
            )
            .put(
                Table::RelationshipsByTo,
                keys::index_key(to_node_id, relationship.id),
                serde_json::Value::Null,
            );
        self.ids.stage_issued(relationship.id.0, &mut batch);
        self.backend.apply(batch)?;

        tracing::debug!(
            relationship_id = %relationship.id,
            from = %from_node_id,
            to = %to_node_id,
            "Relationship stored"
        );
        Ok(relationship)
    }

    pub fn get(&self, id: RelationshipId) -> GraphResult<Option<Relationship>> {
        match self
            .backend
            .get(Table::Relationships, &keys::relationship_key(id))?
        {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Relationships whose `from` end is `node_id`, in creation order.
    pub fn find_by_from(&self, node_id: NodeId) -> GraphResult<Vec<Relationship>> {
        self.scan_index(Table::RelationshipsByFrom, node_id)
    }

    /// Relationships whose `to` end is `node_id`, in creation order.
    pub fn find_by_to(&self, node_id: NodeId) -> GraphResult<Vec<Relationship>> {
        self.scan_index(Table::RelationshipsByTo, node_id)
    }

    fn scan_index(&self, index: Table, node_id: NodeId) -> GraphResult<Vec<Relationship>> {
        let entries = self
            .backend
            .scan_prefix(index, &keys::index_prefix(node_id))?;

        let mut results = Vec::with_capacity(entries.len());
        for (key, _) in entries {
            let Some(id) = keys::decode_index_key(&key) else {
                tracing::warn!(index = index.as_str(), key = %key, "Skipping malformed index key");
                continue;
            };
            match self.get(id)? {
                Some(relationship) => results.push(relationship),
                None => {
                    tracing::warn!(
                        index = index.as_str(),
                        relationship_id = %id,
                        "Index entry without a record"
                    );
                }
            }
        }
        Ok(results)
    }

    pub fn count(&self) -> GraphResult<usize> {
        Ok(self.backend.scan_prefix(Table::Relationships, "")?.len())
    }

    /// Remove the record and both index entries. Returns whether it existed.
    pub fn delete(&self, id: RelationshipId) -> GraphResult<bool> {
        let Some(relationship) = self.get(id)? else {
            return Ok(false);
        };
        let mut batch = WriteBatch::new();
        self.stage_delete(&relationship, &mut batch);
        self.backend.apply(batch)?;
        Ok(true)
    }

    /// Add the deletion of `relationship` to a batch without applying it.
    ///
    /// Index entries are staged before the record.
    pub fn stage_delete(&self, relationship: &Relationship, batch: &mut WriteBatch) {
        batch
            .delete(
                Table::RelationshipsByFrom,
                keys::index_key(relationship.from_node_id, relationship.id),
            )
            .delete(
                Table::RelationshipsByTo,
                keys::index_key(relationship.to_node_id, relationship.id),
            )
            .delete(Table::Relationships, keys::relationship_key(relationship.id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    fn store() -> RelationshipStore {
        RelationshipStore::open(Arc::new(MemoryBackend::new())).unwrap()
    }

    fn ids(rels: &[Relationship]) -> Vec<RelationshipId> {
        rels.iter().map(|r| r.id).collect()
    }

    #[test]
    fn indexes_both_directions() {
        let store = store();
        let r1 = store
            .create(RelationshipType::DependsOn, None, NodeId(1), NodeId(2))
            .unwrap();
        let r2 = store
            .create(RelationshipType::PartOf, Some("chapter"), NodeId(1), NodeId(3))
            .unwrap();
        let r3 = store
            .create(RelationshipType::References, None, NodeId(3), NodeId(1))
            .unwrap();

        assert_eq!(ids(&store.find_by_from(NodeId(1)).unwrap()), vec![r1.id, r2.id]);
        assert_eq!(ids(&store.find_by_to(NodeId(1)).unwrap()), vec![r3.id]);
        assert_eq!(ids(&store.find_by_to(NodeId(3)).unwrap()), vec![r2.id]);
        assert!(store.find_by_from(NodeId(2)).unwrap().is_empty());
        assert_eq!(store.count().unwrap(), 3);
    }

    #[test]
    fn prefix_does_not_leak_between_node_ids() {
        let store = store();
        store
            .create(RelationshipType::RelatesTo, None, NodeId(1), NodeId(2))
            .unwrap();
        store
            .create(RelationshipType::RelatesTo, None, NodeId(10), NodeId(2))
            .unwrap();
        store
            .create(RelationshipType::RelatesTo, None, NodeId(11), NodeId(2))
            .unwrap();

        assert_eq!(store.find_by_from(NodeId(1)).unwrap().len(), 1);
        assert_eq!(store.find_by_to(NodeId(2)).unwrap().len(), 3);
    }

    #[test]
    fn delete_removes_record_and_index_entries() {
        let store = store();
        let rel = store
            .create(RelationshipType::Contradicts, None, NodeId(5), NodeId(6))
            .unwrap();

        assert!(store.delete(rel.id).unwrap());
        assert!(store.get(rel.id).unwrap().is_none());
        assert!(store.find_by_from(NodeId(5)).unwrap().is_empty());
        assert!(store.find_by_to(NodeId(6)).unwrap().is_empty());
        assert_eq!(store.count().unwrap(), 0);

        assert!(!store.delete(rel.id).unwrap());
    }

    #[test]
    fn self_loop_appears_in_both_indexes() {
        let store = store();
        let rel = store
            .create(RelationshipType::DerivedFrom, None, NodeId(4), NodeId(4))
            .unwrap();

        assert_eq!(ids(&store.find_by_from(NodeId(4)).unwrap()), vec![rel.id]);
        assert_eq!(ids(&store.find_by_to(NodeId(4)).unwrap()), vec![rel.id]);

        store.delete(rel.id).unwrap();
        assert!(store.find_by_from(NodeId(4)).unwrap().is_empty());
        assert!(store.find_by_to(NodeId(4)).unwrap().is_empty());
    }

    #[test]
    fn notes_round_trip() {
        let store = store();
        let rel = store
            .create(RelationshipType::PartOf, Some("see appendix"), NodeId(1), NodeId(2))
            .unwrap();
        let fetched = store.get(rel.id).unwrap().unwrap();
        assert_eq!(fetched.notes.as_deref(), Some("see appendix"));
        assert_eq!(fetched, rel);
    }
}
