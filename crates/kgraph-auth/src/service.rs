//! Token issuance and verification.

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use kgraph_core::config::AuthConfig;
use uuid::Uuid;

use crate::claims::{Claims, TokenKind, TokenPair};
use crate::clock::{Clock, SystemClock};
use crate::error::{AuthError, AuthResult, Rejection};
use crate::key::SigningKey;

/// Issues and validates stateless bearer tokens.
///
/// Owns its [`SigningKey`]; two services never accept each other's tokens
/// unless they were built with the same key.
pub struct TokenService {
    key: SigningKey,
    clock: Arc<dyn Clock>,
    issuer: String,
    audience: Option<String>,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenService {
    /// Build with a freshly generated key and the system clock.
    pub fn new(config: &AuthConfig) -> Self {
        Self::with_clock(config, SigningKey::generate(), Arc::new(SystemClock))
    }

    pub fn with_clock(config: &AuthConfig, key: SigningKey, clock: Arc<dyn Clock>) -> Self {
        tracing::debug!(
            issuer = %config.issuer,
            audience = ?config.audience,
            access_ttl_secs = config.access_token_ttl_secs,
            refresh_ttl_secs = config.refresh_token_ttl_secs,
            "Token service initialized"
        );
        Self {
            key,
            clock,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            access_ttl_secs: i64::try_from(config.access_token_ttl_secs).unwrap_or(i64::MAX),
            refresh_ttl_secs: i64::try_from(config.refresh_token_ttl_secs).unwrap_or(i64::MAX),
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    // ── Issuance ─────────────────────────────────────────────────

    pub fn issue_access_token(&self, subject: &str) -> AuthResult<String> {
        self.issue(subject, TokenKind::Access)
    }

    pub fn issue_refresh_token(&self, subject: &str) -> AuthResult<String> {
        self.issue(subject, TokenKind::Refresh)
    }

    /// Mint an access/refresh pair for `subject`.
    pub fn issue_tokens(&self, subject: &str) -> AuthResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.issue_access_token(subject)?,
            refresh_token: self.issue_refresh_token(subject)?,
        })
    }

    fn issue(&self, subject: &str, kind: TokenKind) -> AuthResult<String> {
        if subject.trim().is_empty() {
            return Err(AuthError::Validation("subject must not be empty".to_string()));
        }

        let iat = self.clock.now().timestamp();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl_secs,
            TokenKind::Refresh => self.refresh_ttl_secs,
        };
        let claims = Claims {
            sub: subject.to_string(),
            iat,
            exp: iat.saturating_add(ttl),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind,
            jti: Uuid::new_v4(),
        };

        let payload =
            serde_json::to_vec(&claims).map_err(|e| AuthError::Encoding(e.to_string()))?;
        let claims_segment = URL_SAFE_NO_PAD.encode(payload);
        let mac = self.key.mac(claims_segment.as_bytes());

        tracing::debug!(subject, %kind, exp = claims.exp, "Token issued");
        Ok(format!(
            "{claims_segment}.{}",
            URL_SAFE_NO_PAD.encode(mac.as_bytes())
        ))
    }

    // ── Verification ─────────────────────────────────────────────

    /// Check signature, issuer, audience (if configured), expiry and that
    /// the token names `expected_subject`. Either token kind passes.
    pub fn validate(&self, token: &str, expected_subject: &str) -> AuthResult<Claims> {
        self.check(token, expected_subject, None).map_err(reject)
    }

    /// [`Self::validate`], and the token must be an access token.
    pub fn authorize(&self, token: &str, subject: &str) -> AuthResult<Claims> {
        self.check(token, subject, Some(TokenKind::Access))
            .map_err(reject)
    }

    /// The subject a correctly signed token names. Does not check issuer,
    /// audience or expiry.
    pub fn extract_subject(&self, token: &str) -> AuthResult<String> {
        self.verify_signature(token)
            .map(|claims| claims.sub)
            .map_err(reject)
    }

    /// Exchange a valid refresh token for a new access token.
    pub fn refresh_access_token(&self, refresh_token: &str) -> AuthResult<String> {
        let subject = self.extract_subject(refresh_token)?;
        self.check(refresh_token, &subject, Some(TokenKind::Refresh))
            .map_err(reject)?;

        tracing::info!(subject = %subject, "Access token refreshed");
        self.issue_access_token(&subject)
    }

    fn check(
        &self,
        token: &str,
        expected_subject: &str,
        required_kind: Option<TokenKind>,
    ) -> Result<Claims, Rejection> {
        let claims = self.verify_signature(token)?;

        if claims.iss != self.issuer {
            return Err(Rejection::Issuer { found: claims.iss });
        }
        if let Some(audience) = &self.audience {
            if claims.aud.as_ref() != Some(audience) {
                return Err(Rejection::Audience { found: claims.aud });
            }
        }
        if self.clock.now().timestamp() >= claims.exp {
            return Err(Rejection::Expired { exp: claims.exp });
        }
        if claims.sub != expected_subject {
            return Err(Rejection::Subject { found: claims.sub });
        }
        if let Some(expected) = required_kind {
            if claims.kind != expected {
                return Err(Rejection::Kind {
                    found: claims.kind,
                    expected,
                });
            }
        }
        Ok(claims)
    }

    fn verify_signature(&self, token: &str) -> Result<Claims, Rejection> {
        let (claims_segment, mac_segment) = token.split_once('.').ok_or(Rejection::Shape)?;
        if mac_segment.contains('.') {
            return Err(Rejection::Shape);
        }

        let provided = URL_SAFE_NO_PAD
            .decode(mac_segment)
            .map_err(|_| Rejection::Encoding)?;
        let provided: [u8; 32] = provided.try_into().map_err(|_| Rejection::Signature)?;
        // blake3::Hash equality is constant-time.
        if self.key.mac(claims_segment.as_bytes()) != blake3::Hash::from(provided) {
            return Err(Rejection::Signature);
        }

        let payload = URL_SAFE_NO_PAD
            .decode(claims_segment)
            .map_err(|_| Rejection::Encoding)?;
        Ok(serde_json::from_slice(&payload)?)
    }
}

fn reject(reason: Rejection) -> AuthError {
    tracing::debug!(%reason, "Token rejected");
    AuthError::InvalidCredential
}
