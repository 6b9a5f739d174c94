//! Central redaction of secrets in diagnostic output.

use std::borrow::Cow;
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::Level;
use zeroize::Zeroizing;

use super::DiagnosticSink;

/// Replacement text for scrubbed material
pub const REDACTED: &str = "[REDACTED]";

/// Pattern and replacement for material recognizable by shape
struct RedactPattern {
    pattern: &'static str,
    replacement: &'static str,
}

const REDACT_PATTERNS: &[RedactPattern] = &[
    // Session token in a greeting line
    RedactPattern {
        pattern: r"(Session-Token:\s*)\S+",
        replacement: "${1}[REDACTED]",
    },
    // All three segments of an authenticate command
    RedactPattern {
        pattern: r"(secure/authenticate/)\S*",
        replacement: "${1}[REDACTED]",
    },
    // PEM key blocks, single-line or wrapped
    RedactPattern {
        pattern: r"(?s)-----BEGIN [A-Z ]*KEY-----.*?-----END [A-Z ]*KEY-----",
        replacement: "[REDACTED KEY]",
    },
];

lazy_static! {
    static ref REDACT_REGEX: Vec<(Regex, &'static str)> = {
        REDACT_PATTERNS
            .iter()
            .filter_map(|p| Regex::new(p.pattern).ok().map(|r| (r, p.replacement)))
            .collect()
    };
}

/// Scrub shape-recognizable secrets (session tokens, authenticate
/// commands, PEM keys) from `message`.
pub fn redact_patterns(message: &str) -> Cow<'_, str> {
    let mut out = Cow::Borrowed(message);
    for (regex, replacement) in REDACT_REGEX.iter() {
        if regex.is_match(&out) {
            out = Cow::Owned(regex.replace_all(&out, *replacement).into_owned());
        }
    }
    out
}

/// Sink wrapper that scrubs registered secrets and known patterns.
pub struct RedactingSink {
    inner: Arc<dyn DiagnosticSink>,
    secrets: Vec<Zeroizing<String>>,
}

impl RedactingSink {
    /// Wrap `inner`.
    pub fn new(inner: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            inner,
            secrets: Vec::new(),
        }
    }

    /// Register an exact secret (e.g. the credential) to scrub.
    pub fn with_secret(mut self, secret: &str) -> Self {
        self.add_secret(secret);
        self
    }

    /// Register a secret learned after construction, such as a session token.
    pub fn add_secret(&mut self, secret: &str) {
        if !secret.is_empty() && !self.secrets.iter().any(|s| s.as_str() == secret) {
            self.secrets.push(Zeroizing::new(secret.to_string()));
        }
    }

    /// Apply secret and pattern redaction.
    pub fn redact(&self, message: &str) -> String {
        let mut out = message.to_string();
        for secret in &self.secrets {
            if out.contains(secret.as_str()) {
                out = out.replace(secret.as_str(), REDACTED);
            }
        }
        redact_patterns(&out).into_owned()
    }
}

impl DiagnosticSink for RedactingSink {
    fn emit(&self, level: Level, message: &str) {
        self.inner.emit(level, &self.redact(message));
    }
}

impl std::fmt::Debug for RedactingSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedactingSink")
            .field("secrets", &self.secrets.len())
            .finish_non_exhaustive()
    }
}
