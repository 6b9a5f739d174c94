//! Connection abstraction for the handshake.
//!
//! The handshake owns one message-oriented connection exclusively for the
//! duration of an attempt. Backends:
//! - **WebSocket**: `tokio-tungstenite` client (`websocket` feature)
//! - **Channel**: in-process duplex over `tokio::sync::mpsc`
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        Handshake driver (protocol)       │
//! │          (Transport-Agnostic)            │
//! └──────────────────┬──────────────────────┘
//!                    │ Connection
//!          ┌────────┴────────┐
//!          ▼                 ▼
//! ┌─────────────────┐ ┌─────────────────┐
//! │ WebSocketConn.  │ │ ChannelConn.    │
//! │  (ws:// wss://) │ │  (in-process)   │
//! └─────────────────┘ └─────────────────┘
//! ```

mod channel;
#[cfg(feature = "websocket")]
mod websocket;

pub use channel::ChannelConnection;
#[cfg(feature = "websocket")]
pub use websocket::WebSocketConnection;

use async_trait::async_trait;

use crate::error::Result;

/// A persistent, message-oriented connection to the controller.
///
/// Implementations report transport failures as
/// [`AuthError::Connection`](crate::error::AuthError::Connection).
#[async_trait]
pub trait Connection: Send {
    /// Send one text message.
    async fn send(&mut self, message: &str) -> Result<()>;

    /// Wait for the next text message. `None` means the peer closed.
    ///
    /// Blocks indefinitely if the peer stays silent; callers that need a
    /// deadline wrap the whole handshake in a timeout.
    async fn recv(&mut self) -> Result<Option<String>>;

    /// Close the connection.
    async fn close(&mut self) -> Result<()>;

    /// Transport name for logging.
    fn name(&self) -> &'static str;
}
