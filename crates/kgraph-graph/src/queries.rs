//! Read-side resolution: the bidirectional adjacency view of a node.

use std::sync::Arc;

use kgraph_core::{Connection, Direction, Node, NodeId, Relationship};

use crate::error::GraphResult;
use crate::node_store::NodeStore;
use crate::relationship_store::RelationshipStore;

/// Combines relationship index lookups with node lookups to produce
/// [`Connection`]s.
pub struct ConnectionResolver {
    nodes: Arc<NodeStore>,
    relationships: Arc<RelationshipStore>,
}

impl ConnectionResolver {
    pub fn new(nodes: Arc<NodeStore>, relationships: Arc<RelationshipStore>) -> Self {
        Self {
            nodes,
            relationships,
        }
    }

    // ── Adjacency ────────────────────────────────────────────────

    /// Every relationship incident to `node_id`, paired with the node at the
    /// other end.
    ///
    /// Outgoing connections come first, then incoming, each in creation
    /// order. The two directions are resolved independently, so a self-loop
    /// yields one outgoing and one incoming connection. A relationship whose
    /// other end no longer resolves is left out rather than failing the
    /// query.
    pub fn connections_for(&self, node_id: NodeId) -> GraphResult<Vec<Connection>> {
        let outgoing = self.relationships.find_by_from(node_id)?;
        let incoming = self.relationships.find_by_to(node_id)?;

        let mut connections = Vec::with_capacity(outgoing.len() + incoming.len());
        self.resolve_into(node_id, outgoing, Direction::Outgoing, &mut connections)?;
        self.resolve_into(node_id, incoming, Direction::Incoming, &mut connections)?;

        tracing::debug!(node_id = %node_id, count = connections.len(), "Resolved connections");
        Ok(connections)
    }

    fn resolve_into(
        &self,
        node_id: NodeId,
        relationships: Vec<Relationship>,
        direction: Direction,
        out: &mut Vec<Connection>,
    ) -> GraphResult<()> {
        for relationship in relationships {
            let other_id = relationship.other_end(direction);
            match self.nodes.get(other_id)? {
                Some(node) => out.push(Connection {
                    relationship,
                    node,
                    direction,
                }),
                None => {
                    tracing::warn!(
                        node_id = %node_id,
                        relationship_id = %relationship.id,
                        missing_node_id = %other_id,
                        "Omitting connection to missing node"
                    );
                }
            }
        }
        Ok(())
    }

    // ── Endpoints ────────────────────────────────────────────────

    /// Resolve the `from` and `to` nodes of a relationship. Either side is
    /// `None` if it no longer exists.
    pub fn endpoints(&self, relationship: &Relationship) -> GraphResult<(Option<Node>, Option<Node>)> {
        let from = self.nodes.get(relationship.from_node_id)?;
        let to = self.nodes.get(relationship.to_node_id)?;
        Ok((from, to))
    }
}
