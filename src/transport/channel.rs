//! In-process connection over `tokio` channels.
//!
//! Used to embed the handshake behind another transport and to script a
//! controller in tests.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::Connection;
use crate::error::{AuthError, Result};

/// One end of an in-memory duplex connection.
#[derive(Debug)]
pub struct ChannelConnection {
    tx: Option<mpsc::UnboundedSender<String>>,
    rx: mpsc::UnboundedReceiver<String>,
}

impl ChannelConnection {
    /// Create two connected ends.
    pub fn pair() -> (Self, Self) {
        let (a_tx, b_rx) = mpsc::unbounded_channel();
        let (b_tx, a_rx) = mpsc::unbounded_channel();
        (
            Self {
                tx: Some(a_tx),
                rx: a_rx,
            },
            Self {
                tx: Some(b_tx),
                rx: b_rx,
            },
        )
    }

    /// Whether this end can still send.
    pub fn is_open(&self) -> bool {
        self.tx.as_ref().is_some_and(|tx| !tx.is_closed())
    }
}

#[async_trait]
impl Connection for ChannelConnection {
    async fn send(&mut self, message: &str) -> Result<()> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| AuthError::Connection("connection closed locally".to_string()))?;

        tx.send(message.to_string())
            .map_err(|_| AuthError::Connection("peer closed the connection".to_string()))
    }

    async fn recv(&mut self) -> Result<Option<String>> {
        Ok(self.rx.recv().await)
    }

    async fn close(&mut self) -> Result<()> {
        self.tx = None;
        self.rx.close();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "channel"
    }
}
