//! The symmetric signing key.

use std::fmt;

use rand::RngCore;

/// 32-byte key for the token MAC.
///
/// Generated once when a [`crate::TokenService`] is built and held only in
/// memory. There is deliberately no serializer: restarting the process
/// invalidates every outstanding token.
#[derive(Clone)]
pub struct SigningKey([u8; 32]);

impl SigningKey {
    /// Draw a fresh key from the thread-local OS-seeded RNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Keyed BLAKE3 over `message`.
    pub(crate) fn mac(&self, message: &[u8]) -> blake3::Hash {
        blake3::keyed_hash(&self.0, message)
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(<redacted>)")
    }
}
