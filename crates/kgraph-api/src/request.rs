//! Request envelope and argument parsing.

use std::str::FromStr;

use kgraph_core::{KgError, NodeId, RelationshipId, RelationshipType};
use serde::Deserialize;

/// One request: the credential pair plus the operation.
///
/// ```json
/// {"token": "...", "subject": "alice", "op": "link_nodes",
///  "from": 1, "to": "2", "type": "depends_on", "notes": "build order"}
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(flatten)]
    pub op: Operation,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    AddNode {
        title: String,
        #[serde(default)]
        description: Option<String>,
    },
    LinkNodes {
        from: IdArg,
        to: IdArg,
        #[serde(rename = "type")]
        relationship_type: String,
        #[serde(default)]
        notes: Option<String>,
    },
    DeleteNode {
        id: IdArg,
    },
    DeleteLink {
        id: IdArg,
    },
    GetNode {
        id: IdArg,
    },
    GetLink {
        id: IdArg,
    },
    SearchNodes {
        #[serde(default)]
        query: String,
    },
    #[serde(alias = "connections_for")]
    Connections {
        id: IdArg,
    },
    /// Uses the envelope `subject`.
    IssueTokens,
    Refresh {
        refresh_token: String,
    },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddNode { .. } => "add_node",
            Self::LinkNodes { .. } => "link_nodes",
            Self::DeleteNode { .. } => "delete_node",
            Self::DeleteLink { .. } => "delete_link",
            Self::GetNode { .. } => "get_node",
            Self::GetLink { .. } => "get_link",
            Self::SearchNodes { .. } => "search_nodes",
            Self::Connections { .. } => "connections",
            Self::IssueTokens => "issue_tokens",
            Self::Refresh { .. } => "refresh",
        }
    }

    /// Whether the operation touches the graph and so needs an access token.
    pub fn is_graph_op(&self) -> bool {
        !matches!(self, Self::IssueTokens | Self::Refresh { .. })
    }
}

/// An id as it arrives on the wire: a JSON number or a decimal string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum IdArg {
    Number(u64),
    Text(String),
}

impl IdArg {
    pub fn node_id(&self) -> kgraph_core::Result<NodeId> {
        match self {
            Self::Number(n) => Ok(NodeId(*n)),
            Self::Text(s) => NodeId::from_str(s),
        }
    }

    pub fn relationship_id(&self) -> kgraph_core::Result<RelationshipId> {
        match self {
            Self::Number(n) => Ok(RelationshipId(*n)),
            Self::Text(s) => RelationshipId::from_str(s),
        }
    }
}

pub fn parse_relationship_type(raw: &str) -> kgraph_core::Result<RelationshipType> {
    RelationshipType::from_str(raw)
}

/// Parse one request line. Malformed JSON and unknown operations are
/// validation errors.
pub fn parse_request(line: &str) -> kgraph_core::Result<Request> {
    serde_json::from_str(line).map_err(|e| KgError::Validation(format!("malformed request: {e}")))
}
