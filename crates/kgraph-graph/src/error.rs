//! Error types for graph storage and orchestration.

use kgraph_core::{KgError, NodeId, RelationshipId};
use thiserror::Error;

/// Failures inside a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(&'static str),

    #[error("Corrupt record in table {table} at key {key}")]
    Corrupt { table: &'static str, key: String },
}

/// Errors from graph store and mutation operations.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Relationship not found: {0}")]
    RelationshipNotFound(RelationshipId),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<serde_json::Error> for GraphError {
    fn from(err: serde_json::Error) -> Self {
        Self::Storage(StorageError::Serialization(err))
    }
}

impl From<GraphError> for KgError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::Validation(msg) => KgError::Validation(msg),
            GraphError::NodeNotFound(id) => KgError::node_not_found(id),
            GraphError::RelationshipNotFound(id) => KgError::relationship_not_found(id),
            GraphError::Storage(e) => KgError::Storage(e.to_string()),
        }
    }
}

pub type GraphResult<T> = std::result::Result<T, GraphError>;
