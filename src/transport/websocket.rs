//! WebSocket transport
//!
//! Each [`GatewayMessage`] travels as one JSON text frame. The same type
//! serves the client side (via [`WebSocketTransport::connect`]) and the
//! gateway side (wrapping a stream from `accept_async`).

use super::{GatewayMessage, Transport, TransportError, TransportResult};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

/// Client-side transport returned by [`WebSocketTransport::connect`]
pub type ClientTransport = WebSocketTransport<MaybeTlsStream<TcpStream>>;

/// WebSocket transport over any byte stream
pub struct WebSocketTransport<S> {
    ws: WebSocketStream<S>,
    connected: bool,
}

impl ClientTransport {
    /// Connect to a gateway
    pub async fn connect(url: &str) -> TransportResult<Self> {
        let (ws, _) = connect_async(url)
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        Ok(Self::from_stream(ws))
    }
}

impl<S> WebSocketTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an established WebSocket stream
    pub fn from_stream(ws: WebSocketStream<S>) -> Self {
        WebSocketTransport {
            ws,
            connected: true,
        }
    }
}

#[async_trait]
impl<S> Transport for WebSocketTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + Sync,
{
    async fn send(&mut self, message: &GatewayMessage) -> TransportResult<()> {
        if !self.connected {
            return Err(TransportError::Disconnected);
        }

        let json =
            serde_json::to_string(message).map_err(|e| TransportError::SendFailed(e.to_string()))?;

        self.ws
            .send(Message::Text(json))
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    async fn receive(&mut self) -> TransportResult<GatewayMessage> {
        if !self.connected {
            return Err(TransportError::Disconnected);
        }

        loop {
            match self.ws.next().await {
                Some(Ok(Message::Text(text))) => {
                    return serde_json::from_str(&text)
                        .map_err(|e| TransportError::InvalidData(e.to_string()));
                }
                Some(Ok(Message::Close(_))) | None => {
                    self.connected = false;
                    return Err(TransportError::Disconnected);
                }
                Some(Ok(Message::Ping(data))) => {
                    let _ = self.ws.send(Message::Pong(data)).await;
                }
                Some(Err(e)) => {
                    self.connected = false;
                    return Err(TransportError::ReceiveFailed(e.to_string()));
                }
                _ => continue,
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn close(&mut self) -> TransportResult<()> {
        self.connected = false;
        self.ws
            .close(None)
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }
}
