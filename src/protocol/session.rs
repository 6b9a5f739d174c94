//! Handshake state machine for one authentication attempt.
//!
//! A [`Session`] is created per attempt, fed inbound messages in arrival
//! order, and discarded once it reaches a terminal state. It performs no
//! I/O: each step returns the command to send, if any.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::Level;

use super::message::{classify, AuthResult, Greeting, HandshakeMessage, KeyDisclosure};
use super::{GETKEY_COMMAND, UNKNOWN_ERROR};
use crate::crypto::{Credential, CredentialEncryptor, HybridEncryptor};
use crate::diagnostics::{DiagnosticSink, RedactingSink, TracingSink};
use crate::error::{AuthError, ErrorKind, Result};

/// Handshake state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// Waiting for the greeting line
    AwaitingHello,
    /// Key requested, waiting for the key disclosure
    AwaitingKey,
    /// Authenticate command sent, waiting for the verdict
    AwaitingResult,
    /// Controller accepted the credential
    Authenticated,
    /// Controller rejected the credential
    Rejected,
    /// Attempt aborted on a protocol, crypto, or connection error
    Failed,
}

impl HandshakeState {
    /// Whether the attempt has ended.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Authenticated | Self::Rejected | Self::Failed)
    }

    /// What this state is waiting for, for error messages.
    pub fn expecting(self) -> &'static str {
        match self {
            Self::AwaitingHello => "awaiting greeting",
            Self::AwaitingKey => "awaiting key disclosure",
            Self::AwaitingResult => "awaiting authentication result",
            Self::Authenticated | Self::Rejected | Self::Failed => "finished",
        }
    }
}

/// Overall result of the attempt so far
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Still in progress
    Pending,
    /// Controller accepted the credential
    Authenticated,
    /// Controller rejected the credential
    Rejected,
    /// Ended on a protocol, crypto, or connection error
    Errored,
}

/// Handshake context for one connection attempt.
pub struct Session {
    /// Attempt ID for log correlation
    id: String,
    /// Current state
    state: HandshakeState,
    /// Token from the greeting
    session_token: Option<String>,
    /// Key from the key disclosure
    public_key: Option<String>,
    /// Bearer token to protect
    credential: Credential,
    /// Identity sent alongside the credential
    active_user: String,
    encryptor: Arc<dyn CredentialEncryptor>,
    /// Every diagnostic passes through here; knows the credential and token
    sink: RedactingSink,
    started: Instant,
    messages_sent: u64,
    messages_received: u64,
}

impl Session {
    /// Create a session using the production encryptor and `tracing` output.
    pub fn new(credential: Credential, active_user: impl Into<String>) -> Self {
        let sink = RedactingSink::new(Arc::new(TracingSink)).with_secret(credential.expose());
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            state: HandshakeState::AwaitingHello,
            session_token: None,
            public_key: None,
            credential,
            active_user: active_user.into(),
            encryptor: Arc::new(HybridEncryptor),
            sink,
            started: Instant::now(),
            messages_sent: 0,
            messages_received: 0,
        }
    }

    /// Replace the credential encryptor.
    pub fn with_encryptor(mut self, encryptor: Arc<dyn CredentialEncryptor>) -> Self {
        self.encryptor = encryptor;
        self
    }

    /// Send diagnostics to `sink`. Output is redacted before it gets there.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        let mut redacting = RedactingSink::new(sink).with_secret(self.credential.expose());
        if let Some(token) = &self.session_token {
            redacting.add_secret(token);
        }
        self.sink = redacting;
        self
    }

    /// Get attempt ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get current state
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Check if the controller accepted the credential
    pub fn is_authenticated(&self) -> bool {
        self.state == HandshakeState::Authenticated
    }

    /// Overall outcome of the attempt.
    pub fn outcome(&self) -> Outcome {
        match self.state {
            HandshakeState::AwaitingHello
            | HandshakeState::AwaitingKey
            | HandshakeState::AwaitingResult => Outcome::Pending,
            HandshakeState::Authenticated => Outcome::Authenticated,
            HandshakeState::Rejected => Outcome::Rejected,
            HandshakeState::Failed => Outcome::Errored,
        }
    }

    /// Whether the greeting carried a session token.
    pub fn has_session_token(&self) -> bool {
        self.session_token.is_some()
    }

    /// Whether a public key has been received.
    pub fn has_public_key(&self) -> bool {
        self.public_key.is_some()
    }

    /// Identity sent with the credential.
    pub fn active_user(&self) -> &str {
        &self.active_user
    }

    /// Classify and process one raw inbound message.
    ///
    /// Returns the command to send next, or `None` once authenticated.
    pub fn receive(&mut self, raw: &str) -> Result<Option<String>> {
        if self.state.is_terminal() {
            return Err(AuthError::Protocol(format!(
                "handshake already finished ({:?})",
                self.state
            )));
        }

        self.messages_received += 1;

        match classify(raw) {
            Ok(message) => self.process_message(message),
            Err(err) => Err(self.abort(err)),
        }
    }

    /// Process an already-classified message.
    pub fn process_message(&mut self, message: HandshakeMessage) -> Result<Option<String>> {
        match (self.state, message) {
            (HandshakeState::AwaitingHello, HandshakeMessage::Greeting(greeting)) => {
                self.process_greeting(&greeting).map(Some)
            },
            (HandshakeState::AwaitingKey, HandshakeMessage::KeyDisclosure(disclosure)) => {
                self.process_key_disclosure(&disclosure).map(Some)
            },
            (HandshakeState::AwaitingResult, HandshakeMessage::AuthResult(result)) => {
                self.process_auth_result(&result).map(|()| None)
            },
            (HandshakeState::AwaitingResult, HandshakeMessage::Unrecognized(_)) => {
                Err(self.reject(UNKNOWN_ERROR.to_string()))
            },
            (state, message) => Err(self.abort(AuthError::Protocol(format!(
                "unexpected {} while {}",
                message.kind(),
                state.expecting()
            )))),
        }
    }

    /// Process the greeting and produce the key request.
    pub fn process_greeting(&mut self, greeting: &Greeting) -> Result<String> {
        if self.state != HandshakeState::AwaitingHello {
            return Err(self.out_of_sequence("greeting"));
        }

        self.session_token = greeting.session_token.clone();
        if let Some(token) = &self.session_token {
            self.sink.add_secret(token);
        }

        self.diag(
            Level::INFO,
            &format!(
                "greeting received (version {}, api {}); requesting key",
                greeting.version.as_deref().unwrap_or("?"),
                greeting.api_version.as_deref().unwrap_or("?")
            ),
        );
        if self.session_token.is_none() {
            self.diag(Level::WARN, "greeting carried no session token");
        }

        self.state = HandshakeState::AwaitingKey;
        self.messages_sent += 1;
        Ok(GETKEY_COMMAND.to_string())
    }

    /// Process the key disclosure and produce the authenticate command.
    ///
    /// Fails before invoking the encryptor if no session token was captured.
    pub fn process_key_disclosure(&mut self, disclosure: &KeyDisclosure) -> Result<String> {
        if self.state != HandshakeState::AwaitingKey {
            return Err(self.out_of_sequence("key disclosure"));
        }

        let Some(session_token) = self.session_token.clone() else {
            return Err(self.abort(AuthError::Protocol(
                "no session token captured; cannot authenticate".to_string(),
            )));
        };

        self.diag(Level::INFO, "key disclosure received; encrypting credential");
        self.public_key = Some(disclosure.public_key.clone());

        let command = match self.encryptor.encrypt(
            &disclosure.public_key,
            &session_token,
            &self.credential,
            &self.active_user,
        ) {
            Ok(command) => command,
            Err(err) => return Err(self.abort(err.into())),
        };

        self.diag(
            Level::INFO,
            &format!("sending authenticate command for user '{}'", self.active_user),
        );

        self.state = HandshakeState::AwaitingResult;
        self.messages_sent += 1;
        Ok(command)
    }

    /// Process the controller's verdict.
    pub fn process_auth_result(&mut self, result: &AuthResult) -> Result<()> {
        if self.state != HandshakeState::AwaitingResult {
            return Err(self.out_of_sequence("authentication result"));
        }

        if result.is_success() {
            self.state = HandshakeState::Authenticated;
            self.diag(Level::INFO, "authenticated");
            return Ok(());
        }

        Err(self.reject(result.text()))
    }

    /// End the attempt with `err`, recording it.
    ///
    /// Used for transport failures observed by the driver. Authentication
    /// errors move the session to `Rejected`, everything else to `Failed`.
    pub fn abort(&mut self, err: AuthError) -> AuthError {
        if !self.state.is_terminal() {
            self.state = match err.kind() {
                ErrorKind::Authentication => HandshakeState::Rejected,
                _ => HandshakeState::Failed,
            };
        }
        self.diag(Level::ERROR, &format!("handshake aborted: {err}"));
        err
    }

    /// Get session statistics
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            session_id: self.id.clone(),
            state: self.state,
            messages_sent: self.messages_sent,
            messages_received: self.messages_received,
            elapsed: self.started.elapsed(),
        }
    }

    fn reject(&mut self, text: String) -> AuthError {
        self.state = HandshakeState::Rejected;
        self.diag(Level::WARN, &format!("controller rejected credential: {text}"));
        AuthError::Authentication(text)
    }

    fn out_of_sequence(&mut self, what: &str) -> AuthError {
        let err = AuthError::Protocol(format!(
            "Cannot process {} while {}",
            what,
            self.state.expecting()
        ));
        self.abort(err)
    }

    fn diag(&self, level: Level, message: &str) {
        self.sink.emit(level, &format!("[{}] {}", self.id, message));
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("has_session_token", &self.session_token.is_some())
            .field("has_public_key", &self.public_key.is_some())
            .field("credential", &self.credential)
            .field("active_user", &self.active_user)
            .finish_non_exhaustive()
    }
}

/// Session statistics
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// Attempt ID
    pub session_id: String,
    /// State at the time of the snapshot
    pub state: HandshakeState,
    /// Commands produced
    pub messages_sent: u64,
    /// Messages received
    pub messages_received: u64,
    /// Time since the session was created
    pub elapsed: Duration,
}
