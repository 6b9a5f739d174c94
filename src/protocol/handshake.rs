//! Async handshake driver.
//!
//! Pulls one message at a time from a [`Connection`], feeds it to a
//! [`Session`], and sends whatever command the session produces. There is
//! exactly one suspension point per state (awaiting the next message);
//! dropping the future or closing the connection cancels the attempt.

use std::sync::Arc;

use super::session::{HandshakeState, Session, SessionStats};
use crate::crypto::{Credential, CredentialEncryptor, HybridEncryptor};
use crate::diagnostics::{DiagnosticSink, RedactingSink, TracingSink};
use crate::error::{AuthError, Result};
use crate::transport::Connection;

/// Authenticate on an already-open connection.
///
/// Succeeds once the controller accepts the credential; otherwise returns
/// the first error. The caller should close the connection on failure.
pub async fn authenticate<C>(connection: &mut C, credential: &Credential, active_user: &str) -> Result<()>
where
    C: Connection + ?Sized,
{
    Authenticator::new()
        .run(connection, credential, active_user)
        .await
        .map(|_| ())
}

/// Configurable handshake runner.
#[derive(Clone)]
pub struct Authenticator {
    encryptor: Arc<dyn CredentialEncryptor>,
    sink: Arc<dyn DiagnosticSink>,
}

impl Authenticator {
    /// Production encryptor, diagnostics to `tracing`.
    pub fn new() -> Self {
        Self {
            encryptor: Arc::new(HybridEncryptor),
            sink: Arc::new(TracingSink),
        }
    }

    /// Send diagnostics to `sink`. Output is always redacted first.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Replace the credential encryptor.
    pub fn with_encryptor(mut self, encryptor: Arc<dyn CredentialEncryptor>) -> Self {
        self.encryptor = encryptor;
        self
    }

    /// Run one authentication attempt to completion.
    pub async fn run<C>(
        &self,
        connection: &mut C,
        credential: &Credential,
        active_user: &str,
    ) -> Result<SessionStats>
    where
        C: Connection + ?Sized,
    {
        let sink = RedactingSink::new(self.sink.clone()).with_secret(credential.expose());

        let mut session = Session::new(credential.clone(), active_user)
            .with_encryptor(self.encryptor.clone())
            .with_sink(self.sink.clone());

        sink.emit(
            tracing::Level::DEBUG,
            &format!(
                "[{}] starting handshake over {}",
                session.id(),
                connection.name()
            ),
        );

        loop {
            let raw = match connection.recv().await {
                Ok(Some(raw)) => raw,
                Ok(None) => {
                    let err = AuthError::Connection(format!(
                        "connection closed while {}",
                        session.state().expecting()
                    ));
                    return Err(session.abort(err));
                },
                Err(err) => return Err(session.abort(err)),
            };

            if let Some(command) = session.receive(&raw)? {
                if let Err(err) = connection.send(&command).await {
                    return Err(session.abort(err));
                }
            }

            if session.state() == HandshakeState::Authenticated {
                return Ok(session.stats());
            }
        }
    }
}

impl Default for Authenticator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator").finish_non_exhaustive()
    }
}
