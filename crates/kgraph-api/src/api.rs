//! The operation facade over graph and token services.

use kgraph_auth::{TokenPair, TokenService};
use kgraph_core::{Connection, KgConfig, KgError, Node, NodeId, Relationship, RelationshipId};
use kgraph_graph::{DeleteNodeReport, KnowledgeGraph};
use serde::Serialize;
use serde_json::json;

use crate::request::{self, Operation, Request};
use crate::response::Response;

/// A relationship with both endpoints resolved. An endpoint that no longer
/// exists is `None`.
#[derive(Debug, Clone, Serialize)]
pub struct LinkView {
    pub relationship: Relationship,
    pub from: Option<Node>,
    pub to: Option<Node>,
}

/// Every externally visible operation in one place.
///
/// The typed methods perform no credential checks; callers that hold a
/// resolved subject (the local CLI, tests) call them directly. Token gating
/// lives in [`GraphApi::handle`].
pub struct GraphApi {
    graph: KnowledgeGraph,
    tokens: TokenService,
    require_auth: bool,
}

impl GraphApi {
    pub fn new(graph: KnowledgeGraph, tokens: TokenService, require_auth: bool) -> Self {
        Self {
            graph,
            tokens,
            require_auth,
        }
    }

    /// Open the configured backend and generate a fresh signing key.
    pub fn from_config(config: &KgConfig) -> kgraph_core::Result<Self> {
        let graph = KnowledgeGraph::open(&config.storage)?;
        let tokens = TokenService::new(&config.auth);
        Ok(Self::new(graph, tokens, config.auth.require_auth))
    }

    pub fn graph(&self) -> &KnowledgeGraph {
        &self.graph
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    // ── Graph operations ─────────────────────────────────────────

    pub fn add_node(&self, title: &str, description: Option<&str>) -> kgraph_core::Result<Node> {
        Ok(self.graph.mutations().add_node(title, description)?)
    }

    pub fn link_nodes(
        &self,
        from: NodeId,
        to: NodeId,
        relationship_type: &str,
        notes: Option<&str>,
    ) -> kgraph_core::Result<Relationship> {
        let relationship_type = request::parse_relationship_type(relationship_type)?;
        Ok(self
            .graph
            .mutations()
            .link_nodes(from, to, relationship_type, notes)?)
    }

    pub fn delete_node(&self, id: NodeId) -> kgraph_core::Result<DeleteNodeReport> {
        Ok(self.graph.mutations().delete_node(id)?)
    }

    pub fn delete_link(&self, id: RelationshipId) -> kgraph_core::Result<()> {
        Ok(self.graph.mutations().delete_link(id)?)
    }

    pub fn get_node(&self, id: NodeId) -> kgraph_core::Result<Node> {
        Ok(self.graph.mutations().get_node(id)?)
    }

    pub fn get_link(&self, id: RelationshipId) -> kgraph_core::Result<LinkView> {
        let relationship = self.graph.mutations().get_link(id)?;
        let (from, to) = self.graph.resolver().endpoints(&relationship)?;
        Ok(LinkView {
            relationship,
            from,
            to,
        })
    }

    pub fn search_nodes(&self, title_query: &str) -> kgraph_core::Result<Vec<Node>> {
        Ok(self.graph.mutations().search_nodes(title_query)?)
    }

    /// Connections of `id`. An unknown id has no connections.
    pub fn connections_for(&self, id: NodeId) -> kgraph_core::Result<Vec<Connection>> {
        Ok(self.graph.resolver().connections_for(id)?)
    }

    // ── Token operations ─────────────────────────────────────────

    /// Mint an access/refresh pair for an already-authenticated subject.
    pub fn issue_tokens(&self, subject: &str) -> kgraph_core::Result<TokenPair> {
        let pair = self.tokens.issue_tokens(subject)?;
        tracing::info!(subject, "Tokens issued");
        Ok(pair)
    }

    pub fn refresh_access_token(&self, refresh_token: &str) -> kgraph_core::Result<String> {
        Ok(self.tokens.refresh_access_token(refresh_token)?)
    }

    // ── Envelope dispatch ────────────────────────────────────────

    /// Parse and answer one JSON request line.
    pub fn handle_line(&self, line: &str) -> Response {
        match request::parse_request(line) {
            Ok(request) => self.handle(request),
            Err(err) => {
                tracing::debug!(error = %err, "Rejected malformed request");
                Response::failure(&err)
            }
        }
    }

    /// Authenticate (for graph operations) and dispatch one request.
    pub fn handle(&self, request: Request) -> Response {
        let op = request.op.name();
        if request.op.is_graph_op() {
            if let Err(err) = self.authenticate(&request) {
                tracing::debug!(op, "Request not authenticated");
                return Response::failure(&err);
            }
        }

        let response = self.dispatch(request);
        tracing::debug!(op, ok = response.ok, code = ?response.code(), "Request handled");
        response
    }

    fn authenticate(&self, request: &Request) -> kgraph_core::Result<()> {
        if !self.require_auth {
            return Ok(());
        }
        let (Some(token), Some(subject)) = (&request.token, &request.subject) else {
            return Err(KgError::InvalidCredential);
        };
        self.tokens.authorize(token, subject)?;
        Ok(())
    }

    fn dispatch(&self, request: Request) -> Response {
        match request.op {
            Operation::AddNode { title, description } => {
                self.add_node(&title, description.as_deref()).into()
            }
            Operation::LinkNodes {
                from,
                to,
                relationship_type,
                notes,
            } => (|| {
                let from = from.node_id()?;
                let to = to.node_id()?;
                self.link_nodes(from, to, &relationship_type, notes.as_deref())
            })()
            .into(),
            Operation::DeleteNode { id } => id
                .node_id()
                .and_then(|id| self.delete_node(id))
                .into(),
            Operation::DeleteLink { id } => id
                .relationship_id()
                .and_then(|id| self.delete_link(id).map(|()| json!({ "deleted": id })))
                .into(),
            Operation::GetNode { id } => id.node_id().and_then(|id| self.get_node(id)).into(),
            Operation::GetLink { id } => id
                .relationship_id()
                .and_then(|id| self.get_link(id))
                .into(),
            Operation::SearchNodes { query } => self.search_nodes(&query).into(),
            Operation::Connections { id } => id
                .node_id()
                .and_then(|id| self.connections_for(id))
                .into(),
            Operation::IssueTokens => match request.subject.as_deref() {
                Some(subject) => self.issue_tokens(subject).into(),
                None => Response::failure(&KgError::Validation(
                    "issue_tokens requires a subject".to_string(),
                )),
            },
            Operation::Refresh { refresh_token } => self
                .refresh_access_token(&refresh_token)
                .map(|access_token| json!({ "accessToken": access_token }))
                .into(),
        }
    }
}
