//! Injected diagnostic output.
//!
//! The handshake never calls a global logger for its own events. All
//! diagnostics go through a caller-supplied [`DiagnosticSink`], which lets
//! one place ([`RedactingSink`]) scrub credentials, session tokens, and key
//! material before anything is written.
//!
//! | Sink | Destination |
//! |------|-------------|
//! | [`TracingSink`] | `tracing` events under target `loxaudio::handshake` |
//! | [`MemorySink`] | In-memory buffer (tests, embedding UIs) |
//! | [`NullSink`] | Discarded |
//! | [`RedactingSink`] | Wraps another sink, scrubbing secrets first |

mod redact;

use std::sync::{Mutex, PoisonError};

use tracing::Level;

pub use redact::{redact_patterns, RedactingSink, REDACTED};

/// `tracing` target used by [`TracingSink`]
pub const TRACING_TARGET: &str = "loxaudio::handshake";

/// Destination for handshake diagnostics.
pub trait DiagnosticSink: Send + Sync {
    /// Record one diagnostic line.
    fn emit(&self, level: Level, message: &str);
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, level: Level, message: &str) {
        if level == Level::ERROR {
            tracing::error!(target: TRACING_TARGET, "{}", message);
        } else if level == Level::WARN {
            tracing::warn!(target: TRACING_TARGET, "{}", message);
        } else if level == Level::INFO {
            tracing::info!(target: TRACING_TARGET, "{}", message);
        } else if level == Level::DEBUG {
            tracing::debug!(target: TRACING_TARGET, "{}", message);
        } else {
            tracing::trace!(target: TRACING_TARGET, "{}", message);
        }
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn emit(&self, _level: Level, _message: &str) {}
}

/// Collects diagnostics in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<(Level, String)>>,
}

impl MemorySink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded entries, oldest first.
    pub fn entries(&self) -> Vec<(Level, String)> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Recorded messages without levels.
    pub fn lines(&self) -> Vec<String> {
        self.entries().into_iter().map(|(_, line)| line).collect()
    }

    /// Whether any recorded message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|(_, line)| line.contains(needle))
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&self, level: Level, message: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((level, message.to_string()));
    }
}
