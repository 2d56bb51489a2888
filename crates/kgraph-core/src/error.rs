use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error type for the knowledge graph.
///
/// Every variant maps to one stable [`ErrorCode`] so callers can assert on
/// which failure occurred.
#[derive(Error, Debug)]
pub enum KgError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("Invalid credential")]
    InvalidCredential,

    #[error("Storage error: {0}")]
    Storage(String),
}

impl KgError {
    pub fn node_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            kind: EntityKind::Node,
            id: id.to_string(),
        }
    }

    pub fn relationship_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            kind: EntityKind::Relationship,
            id: id.to_string(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(_) => ErrorCode::ValidationError,
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::InvalidCredential => ErrorCode::InvalidCredential,
            Self::Storage(_) => ErrorCode::StorageFault,
        }
    }
}

/// Which kind of record a not-found error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Node,
    Relationship,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Node => f.write_str("Node"),
            Self::Relationship => f.write_str("Relationship"),
        }
    }
}

/// Stable, caller-visible outcome codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    NotFound,
    InvalidCredential,
    StorageFault,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct_per_variant() {
        assert_eq!(
            KgError::Validation("empty title".into()).code(),
            ErrorCode::ValidationError
        );
        assert_eq!(KgError::node_not_found(3).code(), ErrorCode::NotFound);
        assert_eq!(
            KgError::InvalidCredential.code(),
            ErrorCode::InvalidCredential
        );
        assert_eq!(
            KgError::Storage("disk full".into()).code(),
            ErrorCode::StorageFault
        );
    }

    #[test]
    fn code_serializes_screaming_snake() {
        let json = serde_json::to_string(&ErrorCode::InvalidCredential).unwrap();
        assert_eq!(json, "\"INVALID_CREDENTIAL\"");
    }

    #[test]
    fn not_found_display_names_the_record() {
        let err = KgError::relationship_not_found(12);
        assert_eq!(err.to_string(), "Relationship not found: 12");
    }

    #[test]
    fn invalid_credential_hides_the_reason() {
        assert_eq!(KgError::InvalidCredential.to_string(), "Invalid credential");
    }
}
