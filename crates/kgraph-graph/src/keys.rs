//! Key encoding for backend tables.
//!
//! Ids are zero-padded to 20 digits (the width of `u64::MAX`) so that
//! lexicographic key order equals numeric id order.

use kgraph_core::{NodeId, RelationshipId};

const ID_WIDTH: usize = 20;

pub fn encode_id(id: u64) -> String {
    format!("{:0width$}", id, width = ID_WIDTH)
}

pub fn decode_id(key: &str) -> Option<u64> {
    key.parse().ok()
}

pub fn node_key(id: NodeId) -> String {
    encode_id(id.0)
}

pub fn relationship_key(id: RelationshipId) -> String {
    encode_id(id.0)
}

/// `{node}/{relationship}` entry in a direction index.
pub fn index_key(node: NodeId, relationship: RelationshipId) -> String {
    format!("{}/{}", encode_id(node.0), encode_id(relationship.0))
}

/// Prefix matching every index entry for `node`.
pub fn index_prefix(node: NodeId) -> String {
    format!("{}/", encode_id(node.0))
}

/// Relationship id from a direction index key.
pub fn decode_index_key(key: &str) -> Option<RelationshipId> {
    let (_, rel) = key.split_once('/')?;
    decode_id(rel).map(RelationshipId)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_order_matches_id_order() {
        assert!(encode_id(9) < encode_id(10));
        assert!(encode_id(99) < encode_id(1_000));
        assert_eq!(encode_id(u64::MAX).len(), ID_WIDTH);
    }

    #[test]
    fn index_keys() {
        let key = index_key(NodeId(3), RelationshipId(17));
        assert!(key.starts_with(&index_prefix(NodeId(3))));
        assert!(!key.starts_with(&index_prefix(NodeId(30))));
        assert_eq!(decode_index_key(&key), Some(RelationshipId(17)));
        assert_eq!(decode_index_key("garbage"), None);
    }
}
