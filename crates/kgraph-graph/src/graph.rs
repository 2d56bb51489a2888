//! Backend selection and the shared graph handle.

use std::sync::Arc;

use kgraph_core::config::{BackendKind, StorageConfig};

use crate::backend::{JsonFileBackend, MemoryBackend, StorageBackend};
use crate::error::GraphResult;
use crate::mutations::GraphMutationService;
use crate::node_store::NodeStore;
use crate::queries::ConnectionResolver;
use crate::relationship_store::RelationshipStore;

/// Thread-safe handle to one graph: both stores over a shared backend, the
/// connection resolver, and the mutation service.
///
/// Clone is cheap (inner Arcs).
#[derive(Clone)]
pub struct KnowledgeGraph {
    nodes: Arc<NodeStore>,
    relationships: Arc<RelationshipStore>,
    resolver: Arc<ConnectionResolver>,
    mutations: Arc<GraphMutationService>,
}

impl KnowledgeGraph {
    /// Open the backend named by `config`.
    pub fn open(config: &StorageConfig) -> GraphResult<Self> {
        let backend: Arc<dyn StorageBackend> = match config.backend {
            BackendKind::Memory => Arc::new(MemoryBackend::new()),
            BackendKind::File => Arc::new(JsonFileBackend::open(&config.path)?),
        };
        let graph = Self::with_backend(backend)?;

        tracing::info!(
            backend = ?config.backend,
            nodes = graph.nodes.count()?,
            relationships = graph.relationships.count()?,
            "Graph opened"
        );
        Ok(graph)
    }

    pub fn in_memory() -> GraphResult<Self> {
        Self::with_backend(Arc::new(MemoryBackend::new()))
    }

    pub fn with_backend(backend: Arc<dyn StorageBackend>) -> GraphResult<Self> {
        let nodes = Arc::new(NodeStore::open(backend.clone())?);
        let relationships = Arc::new(RelationshipStore::open(backend.clone())?);
        let resolver = Arc::new(ConnectionResolver::new(
            nodes.clone(),
            relationships.clone(),
        ));
        let mutations = Arc::new(GraphMutationService::new(
            backend,
            nodes.clone(),
            relationships.clone(),
        ));
        Ok(Self {
            nodes,
            relationships,
            resolver,
            mutations,
        })
    }

    pub fn nodes(&self) -> &NodeStore {
        &self.nodes
    }

    pub fn relationships(&self) -> &RelationshipStore {
        &self.relationships
    }

    pub fn resolver(&self) -> &ConnectionResolver {
        &self.resolver
    }

    pub fn mutations(&self) -> &GraphMutationService {
        &self.mutations
    }
}
