//! Secret material: the caller's credential and per-attempt ephemeral keys.
//!
//! Neither type prints its contents in `Debug` output, and both are
//! zeroized on drop.

use std::fmt;

use rand::{CryptoRng, RngCore};
use serde::Deserialize;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::{IV_SIZE, SEED_SIZE, SYMMETRIC_KEY_SIZE};

/// Bearer token proving the client's identity to the controller.
#[derive(Clone, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    /// Wrap a bearer token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Borrow the raw token. Never log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Raw token bytes (UTF-8).
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Whether the token is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Token length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<String> for Credential {
    fn from(token: String) -> Self {
        Self::new(token)
    }
}

impl From<&str> for Credential {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential([REDACTED, {} bytes])", self.0.len())
    }
}

/// Symmetric key and IV for exactly one authentication attempt.
///
/// The symmetric key is the lowercase hex rendering of 16 random bytes,
/// used as 32 ASCII bytes (an AES-256 key slot holding 128 bits of
/// entropy). The controller derives the key the same way, so this must
/// not be "strengthened". The IV is 16 raw random bytes.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct EphemeralKeys {
    key: String,
    iv: [u8; IV_SIZE],
}

impl EphemeralKeys {
    /// Draw fresh key material from a cryptographic RNG.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut seed = [0u8; SEED_SIZE];
        rng.fill_bytes(&mut seed);

        let mut iv = [0u8; IV_SIZE];
        rng.fill_bytes(&mut iv);

        let keys = Self::from_parts(&seed, iv);
        seed.zeroize();
        keys
    }

    /// Build key material from a known seed and IV.
    pub fn from_parts(seed: &[u8; SEED_SIZE], iv: [u8; IV_SIZE]) -> Self {
        Self {
            key: hex::encode(seed),
            iv,
        }
    }

    /// The 32 ASCII bytes used as the AES key.
    pub fn symmetric_key(&self) -> &[u8] {
        self.key.as_bytes()
    }

    /// The raw IV.
    pub fn iv(&self) -> &[u8; IV_SIZE] {
        &self.iv
    }

    /// Hex rendering of the symmetric key bytes, as embedded in the RSA payload.
    pub fn key_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.symmetric_key()))
    }

    /// Hex rendering of the raw IV bytes.
    pub fn iv_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.iv))
    }

    /// The asymmetric plaintext `"<hex-key>:<hex-iv>:<session-token>"`.
    pub fn rsa_plaintext(&self, session_token: &str) -> Zeroizing<String> {
        Zeroizing::new(format!(
            "{}:{}:{}",
            self.key_hex().as_str(),
            self.iv_hex().as_str(),
            session_token
        ))
    }
}

impl fmt::Debug for EphemeralKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EphemeralKeys([REDACTED, {} byte key, {} byte iv])",
            SYMMETRIC_KEY_SIZE, IV_SIZE
        )
    }
}
