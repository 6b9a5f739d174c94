//! Controller login handshake.
//!
//! Authenticates a client on an already-open, message-oriented connection
//! before any audio-control command is accepted. The bearer token never
//! crosses the wire in plaintext.
//!
//! ## Message Flow
//!
//! ```text
//! Client                                   Controller
//!    |                                         |
//!    |<---- LWSS V ... | Session-Token: <t> ---|  Greeting (free text)
//!    |                                         |
//!    |----- audio/cfg/getkey/full ------------>|  Key request
//!    |<---- {"getkey_result":[{"pubkey":..}]} -|  Key disclosure
//!    |                                         |
//!    |----- secure/authenticate/u/rsa/aes ---->|  Hybrid-encrypted credential
//!    |<---- {"authenticate_result": "..."} ----|  Result
//! ```
//!
//! ## State Machine
//!
//! | State            | Expects                  | Next                         |
//! |------------------|--------------------------|------------------------------|
//! | `AwaitingHello`  | greeting line            | `AwaitingKey`                |
//! | `AwaitingKey`    | `getkey_result` reply    | `AwaitingResult`             |
//! | `AwaitingResult` | `authenticate_result`    | `Authenticated` / `Rejected` |
//! | `Authenticated`  | (terminal)               |                              |
//! | `Rejected`       | (terminal)               |                              |
//! | `Failed`         | (terminal)               |                              |
//!
//! Any message that does not match the current state aborts the attempt
//! with a protocol error; there is no re-synchronization.
//!
//! # Usage
//!
//! ```rust,ignore
//! use loxaudio::protocol::authenticate;
//! use loxaudio::transport::WebSocketConnection;
//! use loxaudio::crypto::Credential;
//!
//! let mut conn = WebSocketConnection::connect("ws://10.0.0.5:7091/").await?;
//! authenticate(&mut conn, &Credential::new(jwt), "admin").await?;
//! ```
//!
//! For step-by-step control (e.g. embedding in an existing event loop) use
//! [`Session`] directly and feed it raw messages.

mod handshake;
mod message;
mod session;

pub use handshake::{authenticate, Authenticator};
pub use message::{classify, AuthResult, Greeting, HandshakeMessage, KeyDisclosure};
pub use session::{HandshakeState, Outcome, Session, SessionStats};

/// Leading token of the controller's greeting line
pub const GREETING_PREFIX: &str = "LWSS";

/// Marker preceding the session token inside the greeting
pub const SESSION_TOKEN_MARKER: &str = "Session-Token:";

/// Outbound key request
pub const GETKEY_COMMAND: &str = "audio/cfg/getkey/full";

/// Outbound authenticate command prefix (segments follow, `/`-delimited)
pub const AUTHENTICATE_COMMAND: &str = "secure/authenticate";

/// Key-disclosure reply field
pub const GETKEY_RESULT_FIELD: &str = "getkey_result";

/// Public key field inside the first key-disclosure entry
pub const PUBKEY_FIELD: &str = "pubkey";

/// Authentication reply field
pub const AUTHENTICATE_RESULT_FIELD: &str = "authenticate_result";

/// Result text the controller sends on success
pub const AUTH_SUCCESS: &str = "authentication successful";

/// Rejection text used when the controller supplied none
pub const UNKNOWN_ERROR: &str = "unknown error";
