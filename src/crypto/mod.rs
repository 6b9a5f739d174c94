//! Hybrid credential encryption for the controller login.
//!
//! The controller never sees the bearer token in plaintext. Instead:
//!
//! - **Key normalization**: the single-line public key from `getkey` is
//!   reshaped into a PEM block and imported as an RSA key
//! - **Ephemeral keys**: 16 random bytes rendered as lowercase hex become a
//!   32-byte ASCII AES key; 16 more random bytes are the IV
//! - **AES-256-CBC/PKCS#7**: encrypts the credential
//! - **RSA PKCS#1 v1.5**: wraps `"<hex-key>:<hex-iv>:<session-token>"`
//!
//! # Key Material Quirk
//!
//! The AES key is the *text* of a hex string, so a 256-bit key slot holds
//! 128 bits of entropy. This is how the controller derives the key on its
//! side and has to be reproduced bit-for-bit; a "real" 256-bit key is
//! rejected by the controller.
//!
//! # Example
//!
//! ```ignore
//! use loxaudio::crypto::{Credential, CredentialEncryptor, HybridEncryptor};
//!
//! let command = HybridEncryptor.encrypt(pubkey, "abc123", &Credential::new(jwt), "admin")?;
//! assert!(command.starts_with("secure/authenticate/admin/"));
//! ```

mod aes_cbc;
mod error;
mod keys;
mod payload;
mod pem;
mod rsa_wrap;

pub use aes_cbc::AesCbcCipher;
pub use error::CryptoError;
pub use keys::{Credential, EphemeralKeys};
pub use payload::{build_auth_command, encode_segment, AuthCommand, CredentialEncryptor, HybridEncryptor};
pub use pem::{normalize_public_key, parse_public_key, public_key_der};
pub use rsa_wrap::{max_plaintext_len, unwrap_with, wrap, PKCS1_V15_OVERHEAD};

/// PEM header marker of the controller's public key
pub const PEM_HEADER: &str = "-----BEGIN PUBLIC KEY-----";

/// PEM footer marker of the controller's public key
pub const PEM_FOOTER: &str = "-----END PUBLIC KEY-----";

/// Random bytes behind the hex-rendered symmetric key
pub const SEED_SIZE: usize = 16;

/// Symmetric key length in bytes (ASCII hex of the seed)
pub const SYMMETRIC_KEY_SIZE: usize = SEED_SIZE * 2;

/// AES-CBC initialization vector size
pub const IV_SIZE: usize = 16;
