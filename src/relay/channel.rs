//! Text-frame channels the relay pumps between
//!
//! [`RelayChannel`] is the only thing a session needs from either side.
//! The browser side is an axum [`WebSocket`]; the voice-service side is a
//! tokio-tungstenite client stream opened by [`TungsteniteConnector`].

use axum::extract::ws::{Message as ClientMessage, WebSocket};
use futures_util::{SinkExt, StreamExt};
use std::future::Future;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as UpstreamMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use super::RelayError;

/// A bidirectional stream of text frames.
///
/// `recv` must be cancel-safe: the session polls it inside `select!`.
pub trait RelayChannel: Send {
    /// Next text frame, or `None` once the peer has closed.
    fn recv(&mut self) -> impl Future<Output = Result<Option<String>, RelayError>> + Send;

    fn send(&mut self, text: String) -> impl Future<Output = Result<(), RelayError>> + Send;

    /// Best-effort close; errors are ignored.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

/// Opens the upstream side of a session.
pub trait UpstreamConnector: Send + Sync {
    type Channel: RelayChannel;

    fn connect(&self) -> impl Future<Output = Result<Self::Channel, RelayError>> + Send;
}

/// Browser-facing socket accepted by the HTTP server
pub struct ClientSocket(pub WebSocket);

impl RelayChannel for ClientSocket {
    async fn recv(&mut self) -> Result<Option<String>, RelayError> {
        loop {
            match self.0.recv().await {
                None | Some(Ok(ClientMessage::Close(_))) => return Ok(None),
                Some(Ok(ClientMessage::Text(text))) => return Ok(Some(text.as_str().to_owned())),
                Some(Ok(ClientMessage::Binary(bytes))) => {
                    return Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
                }
                // axum answers pings itself
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(RelayError::Receive(e.to_string())),
            }
        }
    }

    async fn send(&mut self, text: String) -> Result<(), RelayError> {
        self.0
            .send(ClientMessage::Text(text.into()))
            .await
            .map_err(|e| RelayError::Send(e.to_string()))
    }

    async fn close(&mut self) {
        let _ = self.0.send(ClientMessage::Close(None)).await;
    }
}

/// Voice-service connection
pub struct UpstreamSocket(pub WebSocketStream<MaybeTlsStream<TcpStream>>);

impl RelayChannel for UpstreamSocket {
    async fn recv(&mut self) -> Result<Option<String>, RelayError> {
        loop {
            match self.0.next().await {
                None | Some(Ok(UpstreamMessage::Close(_))) => return Ok(None),
                Some(Ok(UpstreamMessage::Text(text))) => {
                    return Ok(Some(text.as_str().to_owned()))
                }
                Some(Ok(UpstreamMessage::Binary(bytes))) => {
                    return Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(RelayError::Receive(e.to_string())),
            }
        }
    }

    async fn send(&mut self, text: String) -> Result<(), RelayError> {
        self.0
            .send(UpstreamMessage::Text(text.into()))
            .await
            .map_err(|e| RelayError::Send(e.to_string()))
    }

    async fn close(&mut self) {
        let _ = self.0.close(None).await;
    }
}

/// Dials the configured voice-service URL once per session.
#[derive(Debug, Clone)]
pub struct TungsteniteConnector {
    url: String,
}

impl TungsteniteConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl UpstreamConnector for TungsteniteConnector {
    type Channel = UpstreamSocket;

    async fn connect(&self) -> Result<UpstreamSocket, RelayError> {
        let (stream, _response) = tokio_tungstenite::connect_async(self.url.as_str())
            .await
            .map_err(|e| RelayError::Connect {
                url: self.url.clone(),
                reason: e.to_string(),
            })?;
        Ok(UpstreamSocket(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_refused_is_a_connect_error() {
        let connector = TungsteniteConnector::new("ws://127.0.0.1:9");
        match connector.connect().await {
            Err(RelayError::Connect { url, .. }) => assert_eq!(url, "ws://127.0.0.1:9"),
            Err(other) => panic!("expected connect error, got {other}"),
            Ok(_) => panic!("connected to a closed port"),
        }
    }

    #[tokio::test]
    async fn test_malformed_url_is_a_connect_error() {
        let connector = TungsteniteConnector::new("not a url");
        assert!(matches!(
            connector.connect().await,
            Err(RelayError::Connect { .. })
        ));
    }
}
