use kgraph_core::KgError;

/// What a caller of the token service can observe.
///
/// Every verification failure is the same [`AuthError::InvalidCredential`];
/// the concrete reason goes to the debug log only.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid credential")]
    InvalidCredential,

    #[error("Token encoding failed: {0}")]
    Encoding(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Why a token was rejected. Never leaves this crate.
#[derive(Debug, thiserror::Error)]
pub(crate) enum Rejection {
    #[error("token is not two dot-separated segments")]
    Shape,

    #[error("segment is not unpadded base64url")]
    Encoding,

    #[error("signature does not match")]
    Signature,

    #[error("claims are not valid JSON: {0}")]
    Claims(#[from] serde_json::Error),

    #[error("issuer {found:?} does not match")]
    Issuer { found: String },

    #[error("audience {found:?} does not match")]
    Audience { found: Option<String> },

    #[error("token expired at {exp}")]
    Expired { exp: i64 },

    #[error("subject {found:?} does not match")]
    Subject { found: String },

    #[error("{found} token used where a {expected} token is required")]
    Kind {
        found: crate::TokenKind,
        expected: crate::TokenKind,
    },
}

impl From<AuthError> for KgError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(msg) => KgError::Validation(msg),
            AuthError::InvalidCredential => KgError::InvalidCredential,
            AuthError::Encoding(msg) => KgError::Storage(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kgraph_core::ErrorCode;

    #[test]
    fn maps_onto_stable_codes() {
        assert_eq!(
            KgError::from(AuthError::InvalidCredential).code(),
            ErrorCode::InvalidCredential
        );
        assert_eq!(
            KgError::from(AuthError::Validation("empty".into())).code(),
            ErrorCode::ValidationError
        );
    }

    #[test]
    fn rejection_reasons_are_descriptive() {
        let reason = Rejection::Expired { exp: 42 };
        assert_eq!(reason.to_string(), "token expired at 42");
    }
}
