//! kgraph-core: shared types, configuration and errors for kgraph.
//!
//! This crate provides the foundational types used across all kgraph crates:
//! - Node and relationship records and their identifiers
//! - The closed set of relationship types
//! - The derived `Connection` view
//! - Configuration management
//! - The error taxonomy and stable error codes

pub mod config;
pub mod error;
pub mod types;

pub use config::KgConfig;
pub use error::{EntityKind, ErrorCode, KgError};
pub use types::{Connection, Direction, Node, NodeId, Relationship, RelationshipId, RelationshipType};

pub type Result<T> = std::result::Result<T, KgError>;
