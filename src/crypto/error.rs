//! Unified cryptographic error type for the login handshake.
//!
//! Every failure inside the hybrid scheme (key import, RSA wrapping,
//! AES encryption, encoding) surfaces as a [`CryptoError`]. None of them
//! are retried: a crypto failure during the handshake means the wiring
//! between the controller's key and this client is broken.
//!
//! # Classification
//!
//! | Error | Falsified Belief |
//! |-------|------------------|
//! | `PublicKey` | The controller sent an importable public key |
//! | `PlaintextTooLong` | The session token fits the RSA modulus |
//! | `Rsa` | The RSA operation would succeed |
//! | `Cipher` | Symmetric key/IV lengths and padding were valid |
//! | `Encoding` | Hex/base64/UTF-8 data was well-formed |

use thiserror::Error;

/// Unified error type for all cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Public key could not be parsed (missing markers, bad base64, bad DER).
    #[error("Invalid public key: {0}")]
    PublicKey(String),

    /// RSA plaintext exceeds what PKCS#1 v1.5 allows for the key modulus.
    #[error("RSA plaintext too long: {len} bytes (max {max})")]
    PlaintextTooLong {
        /// Plaintext length in bytes.
        len: usize,
        /// Maximum length allowed by the modulus.
        max: usize,
    },

    /// RSA encryption or decryption failed.
    #[error("RSA: {0}")]
    Rsa(String),

    /// Symmetric cipher failure (key/IV length, padding).
    #[error("Cipher: {0}")]
    Cipher(String),

    /// Encoding or decoding failure (hex, base64, UTF-8).
    #[error("Encoding: {0}")]
    Encoding(String),
}

impl From<base64::DecodeError> for CryptoError {
    fn from(err: base64::DecodeError) -> Self {
        CryptoError::Encoding(format!("base64: {err}"))
    }
}

impl From<hex::FromHexError> for CryptoError {
    fn from(err: hex::FromHexError) -> Self {
        CryptoError::Encoding(format!("hex: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plaintext_too_long_display() {
        let err = CryptoError::PlaintextTooLong { len: 300, max: 245 };
        assert_eq!(err.to_string(), "RSA plaintext too long: 300 bytes (max 245)");
    }

    #[test]
    fn test_base64_error_conversion() {
        use base64::Engine;

        let err = base64::engine::general_purpose::STANDARD
            .decode("not base64!")
            .unwrap_err();
        let crypto_err: CryptoError = err.into();
        assert!(matches!(crypto_err, CryptoError::Encoding(_)));
        assert!(crypto_err.to_string().contains("base64"));
    }

    #[test]
    fn test_hex_error_conversion() {
        let err = hex::decode("zz").unwrap_err();
        let crypto_err: CryptoError = err.into();
        assert!(matches!(crypto_err, CryptoError::Encoding(_)));
    }
}
