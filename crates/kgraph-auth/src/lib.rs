//! kgraph-auth: signed, time-bound bearer credentials.
//!
//! Tokens identify a subject (a username) and come in two kinds: short-lived
//! access tokens and long-lived refresh tokens that exist only to mint new
//! access tokens. Nothing is persisted; a token is valid exactly when its
//! MAC verifies under the service's in-memory key and its claims pass the
//! issuer, audience, expiry and subject checks.
//!
//! ```text
//! base64url(claims JSON) . base64url(keyed BLAKE3 over the first segment)
//! ```

pub mod claims;
pub mod clock;
pub mod error;
pub mod key;
pub mod service;

pub use claims::{Claims, TokenKind, TokenPair};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{AuthError, AuthResult};
pub use key::SigningKey;
pub use service::TokenService;
