//! WebSocket connection to the controller.
//!
//! Text frames carry handshake messages. Binary frames are accepted if
//! they hold UTF-8; ping/pong frames are skipped (tungstenite answers
//! pings itself).

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use super::Connection;
use crate::error::{AuthError, Result};

/// WebSocket client connection.
pub struct WebSocketConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    url: String,
}

impl WebSocketConnection {
    /// Open a connection to `ws://…` or `wss://…`.
    pub async fn connect(url: &str) -> Result<Self> {
        let (stream, response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| AuthError::Connection(format!("Failed to connect to {url}: {e}")))?;

        tracing::debug!("WebSocket connected to {} ({})", url, response.status());

        Ok(Self {
            stream,
            url: url.to_string(),
        })
    }

    /// Endpoint this connection was opened to.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Connection for WebSocketConnection {
    async fn send(&mut self, message: &str) -> Result<()> {
        self.stream
            .send(Message::Text(message.to_string()))
            .await
            .map_err(|e| AuthError::Connection(format!("WebSocket send failed: {e}")))
    }

    async fn recv(&mut self) -> Result<Option<String>> {
        loop {
            let frame = match self.stream.next().await {
                None => return Ok(None),
                Some(Err(e)) => {
                    return Err(AuthError::Connection(format!("WebSocket receive failed: {e}")))
                },
                Some(Ok(frame)) => frame,
            };

            match frame {
                Message::Text(text) => return Ok(Some(text)),
                Message::Binary(bytes) => {
                    return String::from_utf8(bytes).map(Some).map_err(|_| {
                        AuthError::Protocol("binary frame is not UTF-8".to_string())
                    })
                },
                Message::Close(_) => return Ok(None),
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.stream
            .close(None)
            .await
            .map_err(|e| AuthError::Connection(format!("WebSocket close failed: {e}")))
    }

    fn name(&self) -> &'static str {
        "websocket"
    }
}

impl std::fmt::Debug for WebSocketConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketConnection")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_refused_is_connection_error() {
        // Bind then drop to get a port nothing listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = WebSocketConnection::connect(&format!("ws://127.0.0.1:{port}/"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Connection(_)));
    }

    #[tokio::test]
    async fn test_roundtrip_against_local_server() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            ws.send(Message::Text("LWSS V 1 | Session-Token: t".to_string()))
                .await
                .unwrap();
            let reply = ws.next().await.unwrap().unwrap();
            ws.close(None).await.unwrap();
            reply
        });

        let mut conn = WebSocketConnection::connect(&format!("ws://127.0.0.1:{port}/"))
            .await
            .unwrap();
        assert_eq!(
            conn.recv().await.unwrap().as_deref(),
            Some("LWSS V 1 | Session-Token: t")
        );
        conn.send("audio/cfg/getkey/full").await.unwrap();
        assert!(conn.recv().await.unwrap().is_none());

        let reply = server.await.unwrap();
        assert_eq!(reply, Message::Text("audio/cfg/getkey/full".to_string()));
    }
}
