//! Core domain types for the knowledge graph.
//!
//! Nodes and relationships are the only stored records. A [`Connection`]
//! is a derived view of one relationship incident to a queried node and is
//! never persisted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::KgError;

// ── Identifiers ───────────────────────────────────────────────────

/// Unique identifier for a node, assigned by the node store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct NodeId(pub u64);

/// Unique identifier for a relationship, assigned by the relationship store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct RelationshipId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NodeId {
    type Err = KgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_id(s, "node").map(Self)
    }
}

impl FromStr for RelationshipId {
    type Err = KgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_id(s, "relationship").map(Self)
    }
}

fn parse_id(s: &str, kind: &str) -> Result<u64, KgError> {
    s.trim()
        .parse::<u64>()
        .map_err(|_| KgError::Validation(format!("malformed {kind} id: {s:?}")))
}

// ── Records ───────────────────────────────────────────────────────

/// A single entity or concept in the graph.
///
/// Identity and equality are defined by `id` alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub title: String,
    pub description: Option<String>,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl std::hash::Hash for Node {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A directed, typed relationship between two nodes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Relationship {
    pub id: RelationshipId,
    #[serde(rename = "type")]
    pub relationship_type: RelationshipType,
    pub notes: Option<String>,
    pub from_node_id: NodeId,
    pub to_node_id: NodeId,
}

impl Relationship {
    /// The endpoint opposite `node_id` when traversed in `direction`.
    pub fn other_end(&self, direction: Direction) -> NodeId {
        match direction {
            Direction::Outgoing => self.to_node_id,
            Direction::Incoming => self.from_node_id,
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.from_node_id == self.to_node_id
    }
}

/// The closed set of relationship kinds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipType {
    #[serde(alias = "RELATED_TO")]
    RelatesTo,
    DependsOn,
    PartOf,
    References,
    DerivedFrom,
    Contradicts,
}

impl RelationshipType {
    pub const ALL: [RelationshipType; 6] = [
        Self::RelatesTo,
        Self::DependsOn,
        Self::PartOf,
        Self::References,
        Self::DerivedFrom,
        Self::Contradicts,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RelatesTo => "RELATES_TO",
            Self::DependsOn => "DEPENDS_ON",
            Self::PartOf => "PART_OF",
            Self::References => "REFERENCES",
            Self::DerivedFrom => "DERIVED_FROM",
            Self::Contradicts => "CONTRADICTS",
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationshipType {
    type Err = KgError;

    /// Accepts any casing and `-` in place of `_`, e.g. `depends-on`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace('-', "_");
        if normalized == "RELATED_TO" {
            return Ok(Self::RelatesTo);
        }
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| KgError::Validation(format!("unknown relationship type: {s:?}")))
    }
}

// ── Derived views ─────────────────────────────────────────────────

/// Which way a relationship was traversed from the queried node.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    /// The queried node is the relationship's `from` end.
    Outgoing,
    /// The queried node is the relationship's `to` end.
    Incoming,
}

/// One relationship incident to a queried node, paired with the node at
/// the other end. Recomputed on every query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Connection {
    pub relationship: Relationship,
    pub node: Node,
    pub direction: Direction,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: u64, title: &str) -> Node {
        Node {
            id: NodeId(id),
            title: title.to_string(),
            description: None,
        }
    }

    #[test]
    fn node_equality_is_by_id() {
        let a = node(1, "Graph");
        let mut b = node(1, "Renamed");
        b.description = Some("different".to_string());
        assert_eq!(a, b);
        assert_ne!(a, node(2, "Graph"));
    }

    #[test]
    fn relationship_type_serializes_screaming_snake() {
        let json = serde_json::to_string(&RelationshipType::DependsOn).unwrap();
        assert_eq!(json, "\"DEPENDS_ON\"");

        let json = serde_json::to_string(&RelationshipType::RelatesTo).unwrap();
        assert_eq!(json, "\"RELATES_TO\"");
    }

    #[test]
    fn relationship_type_accepts_legacy_alias() {
        let parsed: RelationshipType = serde_json::from_str("\"RELATED_TO\"").unwrap();
        assert_eq!(parsed, RelationshipType::RelatesTo);
        assert_eq!(
            "related_to".parse::<RelationshipType>().unwrap(),
            RelationshipType::RelatesTo
        );
    }

    #[test]
    fn relationship_type_from_str() {
        assert_eq!(
            "depends-on".parse::<RelationshipType>().unwrap(),
            RelationshipType::DependsOn
        );
        assert_eq!(
            "PART_OF".parse::<RelationshipType>().unwrap(),
            RelationshipType::PartOf
        );
        assert!(matches!(
            "LIKES".parse::<RelationshipType>(),
            Err(KgError::Validation(_))
        ));
    }

    #[test]
    fn relationship_serializes_type_field() {
        let rel = Relationship {
            id: RelationshipId(7),
            relationship_type: RelationshipType::References,
            notes: Some("see chapter 3".to_string()),
            from_node_id: NodeId(1),
            to_node_id: NodeId(2),
        };

        let json = serde_json::to_value(&rel).unwrap();
        assert_eq!(json["type"], "REFERENCES");
        assert_eq!(json["from_node_id"], 1);
        assert_eq!(json["to_node_id"], 2);
    }

    #[test]
    fn other_end_follows_direction() {
        let rel = Relationship {
            id: RelationshipId(1),
            relationship_type: RelationshipType::RelatesTo,
            notes: None,
            from_node_id: NodeId(10),
            to_node_id: NodeId(20),
        };
        assert_eq!(rel.other_end(Direction::Outgoing), NodeId(20));
        assert_eq!(rel.other_end(Direction::Incoming), NodeId(10));
        assert!(!rel.is_self_loop());
    }

    #[test]
    fn ids_parse_from_decimal_strings() {
        assert_eq!("42".parse::<NodeId>().unwrap(), NodeId(42));
        assert_eq!(" 9 ".parse::<RelationshipId>().unwrap(), RelationshipId(9));
        assert!(matches!(
            "abc".parse::<NodeId>(),
            Err(KgError::Validation(_))
        ));
        assert!(matches!("-1".parse::<NodeId>(), Err(KgError::Validation(_))));
    }
}
