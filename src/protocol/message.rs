//! Inbound handshake messages.
//!
//! The controller speaks two dialects on the same connection: a free-text
//! greeting line, and JSON replies keyed by result field.

use serde_json::Value;

use super::{
    AUTHENTICATE_RESULT_FIELD, AUTH_SUCCESS, GETKEY_RESULT_FIELD, GREETING_PREFIX, PUBKEY_FIELD,
    SESSION_TOKEN_MARKER, UNKNOWN_ERROR,
};
use crate::error::{AuthError, Result};

/// A classified inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum HandshakeMessage {
    /// `LWSS ...` greeting line
    Greeting(Greeting),
    /// `{"getkey_result": [{"pubkey": ...}]}`
    KeyDisclosure(KeyDisclosure),
    /// `{"authenticate_result": ...}`
    AuthResult(AuthResult),
    /// Keyed map carrying neither known field
    Unrecognized(Value),
}

impl HandshakeMessage {
    /// Short name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Greeting(_) => "greeting",
            Self::KeyDisclosure(_) => "key disclosure",
            Self::AuthResult(_) => "authentication result",
            Self::Unrecognized(_) => "unrecognized reply",
        }
    }
}

/// Greeting line, e.g. `LWSS V 16.1.11.06 | ~API:1.6~ | Session-Token: abc123`.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Greeting {
    /// Server version (`V <version>`), informational only
    pub version: Option<String>,
    /// API version (`~API:<version>~`), informational only
    pub api_version: Option<String>,
    /// Session token, if the marker was present and non-empty
    pub session_token: Option<String>,
}

impl Greeting {
    /// Parse a line already known to start with the greeting prefix.
    ///
    /// Never fails: missing fields are `None`.
    pub fn parse(line: &str) -> Self {
        let (head, session_token) = match line.split_once(SESSION_TOKEN_MARKER) {
            Some((head, rest)) => (head, Some(rest.trim())),
            None => (line, None),
        };
        let session_token = session_token
            .filter(|token| !token.is_empty())
            .map(str::to_string);

        // Informational fields are only read before the token marker
        let mut version = None;
        let mut api_version = None;
        for field in head.split('|').map(str::trim).filter(|f| !f.is_empty()) {
            if let Some(rest) = field.strip_prefix(GREETING_PREFIX) {
                version = rest
                    .trim()
                    .strip_prefix("V ")
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty());
            } else if let Some(api) = field
                .strip_prefix("~API:")
                .and_then(|rest| rest.strip_suffix('~'))
            {
                api_version = Some(api.to_string());
            }
        }

        Self {
            version,
            api_version,
            session_token,
        }
    }
}

impl std::fmt::Debug for Greeting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Greeting")
            .field("version", &self.version)
            .field("api_version", &self.api_version)
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Public key disclosed by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDisclosure {
    /// Raw key string, typically single-line PEM
    pub public_key: String,
}

impl KeyDisclosure {
    fn from_field(value: &Value) -> Result<Self> {
        let entries = value.as_array().ok_or_else(|| {
            AuthError::Protocol(format!("{GETKEY_RESULT_FIELD} is not a list"))
        })?;

        let first = entries
            .first()
            .ok_or_else(|| AuthError::Protocol(format!("{GETKEY_RESULT_FIELD} is empty")))?;

        let public_key = first
            .get(PUBKEY_FIELD)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                AuthError::Protocol(format!(
                    "{GETKEY_RESULT_FIELD}[0] has no string {PUBKEY_FIELD}"
                ))
            })?;

        Ok(Self {
            public_key: public_key.to_string(),
        })
    }
}

/// Controller's verdict on the authenticate command.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthResult {
    /// Raw field value; usually a string
    pub value: Value,
}

impl AuthResult {
    /// Whether the controller accepted the credential.
    pub fn is_success(&self) -> bool {
        self.value.as_str() == Some(AUTH_SUCCESS)
    }

    /// Result text, or `"unknown error"` if none was supplied.
    pub fn text(&self) -> String {
        match &self.value {
            Value::String(s) if !s.trim().is_empty() => s.clone(),
            Value::Null | Value::String(_) => UNKNOWN_ERROR.to_string(),
            other => other.to_string(),
        }
    }
}

/// Classify one raw inbound unit.
///
/// Lines starting with `LWSS` are greetings; everything else must parse as
/// a JSON object. Within an object, `getkey_result` takes precedence over
/// `authenticate_result`.
pub fn classify(raw: &str) -> Result<HandshakeMessage> {
    if raw.starts_with(GREETING_PREFIX) {
        return Ok(HandshakeMessage::Greeting(Greeting::parse(raw)));
    }

    let value: Value = serde_json::from_str(raw)
        .map_err(|e| AuthError::Protocol(format!("reply is neither greeting nor JSON: {e}")))?;

    let Value::Object(map) = &value else {
        return Err(AuthError::Protocol(
            "structured reply is not a keyed map".to_string(),
        ));
    };

    if let Some(field) = map.get(GETKEY_RESULT_FIELD) {
        return KeyDisclosure::from_field(field).map(HandshakeMessage::KeyDisclosure);
    }

    if let Some(field) = map.get(AUTHENTICATE_RESULT_FIELD) {
        return Ok(HandshakeMessage::AuthResult(AuthResult {
            value: field.clone(),
        }));
    }

    Ok(HandshakeMessage::Unrecognized(value))
}
