//! # Loxaudio - Secure Controller Login
//!
//! Authenticates a client to an audio-controller service over a persistent
//! WebSocket connection, establishing the control channel without ever
//! sending the bearer token in plaintext.
//!
//! ## Features
//!
//! - **Handshake state machine**: greeting → key request → key disclosure →
//!   authenticate → result, with out-of-order messages rejected as protocol errors
//! - **Hybrid encryption**: AES-256-CBC for the credential, RSA PKCS#1 v1.5
//!   for the ephemeral key material, bit-compatible with the controller
//! - **Typed failures**: protocol, crypto, authentication, and connection errors
//! - **Redacted diagnostics**: all handshake output flows through an injected,
//!   redacting sink
//!
//! ## Protocol Overview
//!
//! ```text
//! Client                                   Controller
//!    |<---- LWSS V .. | Session-Token: t ----|
//!    |----- audio/cfg/getkey/full ---------->|
//!    |<---- {"getkey_result":[{pubkey}]} ----|
//!    |----- secure/authenticate/u/rsa/aes -->|
//!    |<---- {"authenticate_result": ..} -----|
//! ```
//!
//! ### State Machine
//!
//! ```text
//!   [AwaitingHello] ──greeting──> [AwaitingKey] ──getkey_result──> [AwaitingResult]
//!          │                            │                           │         │
//!          │ anything else              │ anything else / no token  │ success │ other result
//!          v                            v                           v         v
//!       [Failed] <──────────────────────┘                  [Authenticated] [Rejected]
//! ```
//!
//! ### Hybrid Payload
//!
//! | Step | Value |
//! |------|-------|
//! | AES key | lowercase hex of 16 random bytes, used as 32 ASCII bytes |
//! | IV | 16 raw random bytes |
//! | RSA plaintext | `hex(key):hex(iv):session-token` |
//! | Command | `secure/authenticate/<user>/<rsa_b64>/<aes_b64>`, each segment percent-encoded |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use loxaudio::{authenticate, Credential, WebSocketConnection};
//!
//! let mut conn = WebSocketConnection::connect("ws://10.0.0.5:7091/").await?;
//! match authenticate(&mut conn, &Credential::new(jwt), "admin").await {
//!     Ok(()) => { /* issue audio-control commands */ }
//!     Err(e) if e.is_fallback_candidate() => { /* use the plain integration */ }
//!     Err(e) => return Err(e.into()),
//! }
//! ```
//!
//! ### Step-by-Step
//!
//! ```rust,ignore
//! use loxaudio::{Credential, Session};
//!
//! let mut session = Session::new(Credential::new(jwt), "admin");
//! let getkey = session.receive("LWSS V 16.1.11.06 | ~API:1.6~ | Session-Token: abc123")?;
//! assert_eq!(getkey.as_deref(), Some("audio/cfg/getkey/full"));
//! ```
//!
//! ## Modules
//!
//! - [`protocol`]: Handshake state machine, message classifier, async driver
//! - [`crypto`]: Key normalization and hybrid credential encryption
//! - [`transport`]: Connection trait, WebSocket and in-memory connections
//! - [`diagnostics`]: Injected, redacting diagnostic sinks
//! - [`config`]: Configuration management
//! - [`error`]: Error types and result aliases

pub mod config;
pub mod crypto;
pub mod diagnostics;
pub mod error;
pub mod protocol;
pub mod transport;

// Re-exports for convenience
pub use config::Config;
pub use crypto::{Credential, CredentialEncryptor, CryptoError, HybridEncryptor};
pub use diagnostics::{DiagnosticSink, MemorySink, RedactingSink, TracingSink};
pub use error::{AuthError, ErrorKind, Result};
pub use protocol::{authenticate, Authenticator, HandshakeState, Outcome, Session, SessionStats};
pub use transport::{ChannelConnection, Connection};
#[cfg(feature = "websocket")]
pub use transport::WebSocketConnection;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
