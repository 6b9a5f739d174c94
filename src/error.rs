//! Handshake error types.
//!
//! # Error Classification
//!
//! Every failure of an authentication attempt maps to exactly one kind,
//! so callers can pick a reaction without inspecting messages:
//!
//! | Kind | Meaning | Caller reaction |
//! |------|---------|-----------------|
//! | `Protocol` | Message invalid or out of sequence | Fall back to the non-handshake integration |
//! | `Connection` | Transport closed or faulted | Fall back / reconnect later |
//! | `Authentication` | Controller rejected the credential | Fix the credential |
//! | `Crypto` | Key import or hybrid encryption failed | Bug in the crypto wiring or a bad key |
//!
//! Nothing is retried internally; the attempt ends on the first failure.
//!
//! The `Crypto` variant preserves the full error chain via `#[source]`.

use thiserror::Error;

use crate::crypto::CryptoError;

/// Handshake errors.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Message structurally invalid or out of sequence for the current state.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Public-key import, RSA wrapping, or symmetric encryption failed.
    #[error("Crypto error: {0}")]
    Crypto(#[source] CryptoError),

    /// Controller explicitly rejected the credential; carries its result text.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Transport closed or faulted while a message was expected.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Configuration missing, unreadable, or invalid.
    #[error("Config error: {0}")]
    Config(String),
}

/// Coarse error kind for caller dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid or out-of-sequence message
    Protocol,
    /// Key import or encryption failure
    Crypto,
    /// Credential rejected by the controller
    Authentication,
    /// Transport closed or faulted
    Connection,
    /// Anything outside the handshake itself (configuration)
    Other,
}

impl AuthError {
    /// Kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Protocol(_) => ErrorKind::Protocol,
            Self::Crypto(_) => ErrorKind::Crypto,
            Self::Authentication(_) => ErrorKind::Authentication,
            Self::Connection(_) => ErrorKind::Connection,
            Self::Config(_) => ErrorKind::Other,
        }
    }

    /// Whether the caller should fall back to the plain integration path
    /// rather than treat the credential as bad.
    pub fn is_fallback_candidate(&self) -> bool {
        matches!(self.kind(), ErrorKind::Protocol | ErrorKind::Connection)
    }
}

/// Result type alias for handshake operations
pub type Result<T> = std::result::Result<T, AuthError>;

impl From<CryptoError> for AuthError {
    fn from(err: CryptoError) -> Self {
        AuthError::Crypto(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(AuthError::Protocol("x".into()).kind(), ErrorKind::Protocol);
        assert_eq!(
            AuthError::Authentication("invalid credentials".into()).kind(),
            ErrorKind::Authentication
        );
        assert_eq!(AuthError::Config("x".into()).kind(), ErrorKind::Other);
    }

    #[test]
    fn test_fallback_candidates() {
        assert!(AuthError::Protocol("x".into()).is_fallback_candidate());
        assert!(AuthError::Connection("closed".into()).is_fallback_candidate());
        assert!(!AuthError::Authentication("no".into()).is_fallback_candidate());
        assert!(!AuthError::Crypto(CryptoError::Rsa("x".into())).is_fallback_candidate());
    }

    #[test]
    fn test_crypto_source_chain() {
        use std::error::Error;

        let err: AuthError = CryptoError::PublicKey("missing header marker".into()).into();
        let source = err.source().unwrap();
        assert!(source.to_string().contains("missing header marker"));
    }

    #[test]
    fn test_authentication_carries_server_text() {
        let err = AuthError::Authentication("invalid credentials".into());
        assert_eq!(err.to_string(), "Authentication failed: invalid credentials");
    }
}
