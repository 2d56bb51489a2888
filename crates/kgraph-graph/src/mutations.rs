//! Write operations for the knowledge graph.
//!
//! All mutations pass through a single writer gate, so a link that checks
//! its endpoints can never interleave with the cascade of a node deletion.
//! Reads do not take the gate.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use kgraph_core::{Node, NodeId, Relationship, RelationshipId, RelationshipType};
use serde::Serialize;

use crate::backend::{StorageBackend, WriteBatch};
use crate::error::{GraphError, GraphResult, StorageError};
use crate::node_store::NodeStore;
use crate::relationship_store::RelationshipStore;

/// Longest accepted node title, in characters.
pub const MAX_TITLE_CHARS: usize = 256;

/// What a node deletion removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteNodeReport {
    pub node_id: NodeId,
    /// Incident relationships removed with the node, ascending by id.
    pub removed_relationships: Vec<RelationshipId>,
}

/// Orchestrates mutations that must keep both stores consistent.
pub struct GraphMutationService {
    backend: Arc<dyn StorageBackend>,
    nodes: Arc<NodeStore>,
    relationships: Arc<RelationshipStore>,
    write_gate: Mutex<()>,
}

impl GraphMutationService {
    pub fn new(
        backend: Arc<dyn StorageBackend>,
        nodes: Arc<NodeStore>,
        relationships: Arc<RelationshipStore>,
    ) -> Self {
        Self {
            backend,
            nodes,
            relationships,
            write_gate: Mutex::new(()),
        }
    }

    fn lock_writes(&self) -> GraphResult<MutexGuard<'_, ()>> {
        self.write_gate
            .lock()
            .map_err(|_| GraphError::Storage(StorageError::LockPoisoned("graph write gate")))
    }

    // ── Nodes ────────────────────────────────────────────────────

    /// Create a node. The title must be non-blank and at most
    /// [`MAX_TITLE_CHARS`] characters.
    pub fn add_node(&self, title: &str, description: Option<&str>) -> GraphResult<Node> {
        validate_title(title)?;

        let _gate = self.lock_writes()?;
        let node = self.nodes.create(title, description)?;

        tracing::info!(node_id = %node.id, title = %node.title, "Node added");
        Ok(node)
    }

    /// Delete a node together with every relationship that touches it.
    ///
    /// The relationships and the node go in one atomic batch, with the
    /// relationship entries staged first. Fails with
    /// [`GraphError::NodeNotFound`] if the node does not exist.
    pub fn delete_node(&self, id: NodeId) -> GraphResult<DeleteNodeReport> {
        let _gate = self.lock_writes()?;

        if !self.nodes.exists(id)? {
            return Err(GraphError::NodeNotFound(id));
        }

        // A self-loop shows up in both lookups; key by id to stage it once.
        let mut incident: BTreeMap<RelationshipId, Relationship> = BTreeMap::new();
        for relationship in self
            .relationships
            .find_by_from(id)?
            .into_iter()
            .chain(self.relationships.find_by_to(id)?)
        {
            incident.insert(relationship.id, relationship);
        }

        let mut batch = WriteBatch::new();
        for relationship in incident.values() {
            self.relationships.stage_delete(relationship, &mut batch);
        }
        self.nodes.stage_delete(id, &mut batch);
        self.backend.apply(batch)?;

        let removed_relationships: Vec<RelationshipId> = incident.into_keys().collect();
        tracing::info!(
            node_id = %id,
            cascaded = removed_relationships.len(),
            "Node deleted"
        );
        Ok(DeleteNodeReport {
            node_id: id,
            removed_relationships,
        })
    }

    // ── Relationships ────────────────────────────────────────────

    /// Link two existing nodes.
    ///
    /// Both endpoints are checked under the writer gate; if either is
    /// missing nothing is written and [`GraphError::NodeNotFound`] names the
    /// first missing one (`from` before `to`).
    pub fn link_nodes(
        &self,
        from_node_id: NodeId,
        to_node_id: NodeId,
        relationship_type: RelationshipType,
        notes: Option<&str>,
    ) -> GraphResult<Relationship> {
        let _gate = self.lock_writes()?;

        if !self.nodes.exists(from_node_id)? {
            return Err(GraphError::NodeNotFound(from_node_id));
        }
        if !self.nodes.exists(to_node_id)? {
            return Err(GraphError::NodeNotFound(to_node_id));
        }

        let relationship =
            self.relationships
                .create(relationship_type, notes, from_node_id, to_node_id)?;

        tracing::info!(
            relationship_id = %relationship.id,
            from = %from_node_id,
            to = %to_node_id,
            relationship_type = %relationship_type,
            "Nodes linked"
        );
        Ok(relationship)
    }

    /// Delete one relationship. Fails with
    /// [`GraphError::RelationshipNotFound`] if it does not exist.
    pub fn delete_link(&self, id: RelationshipId) -> GraphResult<()> {
        let _gate = self.lock_writes()?;

        if !self.relationships.delete(id)? {
            return Err(GraphError::RelationshipNotFound(id));
        }

        tracing::info!(relationship_id = %id, "Link deleted");
        Ok(())
    }

    // ── Reads ────────────────────────────────────────────────────

    pub fn get_node(&self, id: NodeId) -> GraphResult<Node> {
        self.nodes.get(id)?.ok_or(GraphError::NodeNotFound(id))
    }

    pub fn get_link(&self, id: RelationshipId) -> GraphResult<Relationship> {
        self.relationships
            .get(id)?
            .ok_or(GraphError::RelationshipNotFound(id))
    }

    pub fn search_nodes(&self, title_query: &str) -> GraphResult<Vec<Node>> {
        self.nodes.search_by_title_substring(title_query)
    }
}

fn validate_title(title: &str) -> GraphResult<()> {
    if title.trim().is_empty() {
        return Err(GraphError::Validation("title must not be empty".to_string()));
    }
    let len = title.chars().count();
    if len > MAX_TITLE_CHARS {
        return Err(GraphError::Validation(format!(
            "title is {len} characters; the limit is {MAX_TITLE_CHARS}"
        )));
    }
    Ok(())
}
