//! kgraph-graph: the graph store and relationship-resolution engine.
//!
//! This crate is the single mutation point for the knowledge graph. Node
//! and relationship records live behind a [`StorageBackend`]; the
//! [`GraphMutationService`] keeps the two stores mutually consistent and the
//! [`ConnectionResolver`] answers "what is connected to X" in both
//! directions.

pub mod backend;
pub mod error;
pub mod graph;
pub mod id_gen;
pub mod keys;
pub mod mutations;
pub mod node_store;
pub mod queries;
pub mod relationship_store;

pub use backend::{JsonFileBackend, MemoryBackend, StorageBackend, Table, WriteBatch};
pub use error::{GraphError, GraphResult, StorageError};
pub use graph::KnowledgeGraph;
pub use mutations::{DeleteNodeReport, GraphMutationService};
pub use node_store::NodeStore;
pub use queries::ConnectionResolver;
pub use relationship_store::RelationshipStore;
