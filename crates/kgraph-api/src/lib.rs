//! kgraph-api: the operation surface over the knowledge graph.
//!
//! [`GraphApi`] exposes the graph and token operations as plain methods.
//! [`GraphApi::handle`] adds the JSON envelope used by `kgraph exec`: each
//! request names an `op`, carries an optional bearer token and subject, and
//! gets back either `{"ok": true, "data": ...}` or an error with a stable
//! code.

pub mod api;
pub mod request;
pub mod response;

pub use api::{GraphApi, LinkView};
pub use request::{IdArg, Operation, Request};
pub use response::{ErrorBody, Response};
