//! Transport layer abstraction
//!
//! This module provides a pluggable transport layer supporting:
//! - In-memory channels (for testing)
//! - WebSocket connections (for the gateway)
//!
//! # Design
//!
//! Transports move [`GatewayMessage`]s and nothing else. Every secret in
//! those messages is already sealed by the handshake, so a transport never
//! needs to be trusted with plaintext.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::wire::{LoginRequest, LoginResponse};

pub mod gateway;
pub mod websocket;

pub use gateway::{serve_connection, GatewayClient};
pub use websocket::{ClientTransport, WebSocketTransport};

/// Transport errors
#[derive(Error, Debug)]
pub enum TransportError {
    /// Connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Connection closed
    #[error("Connection closed")]
    Disconnected,

    /// Send failed
    #[error("Failed to send: {0}")]
    SendFailed(String),

    /// Receive failed
    #[error("Failed to receive: {0}")]
    ReceiveFailed(String),

    /// Invalid data
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// The gateway refused the request
    #[error("Rejected by gateway: {category}")]
    Rejected {
        /// Error category
        category: String,
        /// Offending fields, for validation failures
        fields: Vec<String>,
    },

    /// The peer answered with a message that does not fit the exchange
    #[error("Unexpected message: {0}")]
    UnexpectedMessage(String),
}

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Messages between a client and the gateway
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayMessage {
    /// Ask for the server public key
    GetPublicKey,
    /// Base64 SubjectPublicKeyInfo DER of the server key
    PublicKey {
        /// Encoded key
        key: String,
    },
    /// Sealed login request
    Login(LoginRequest),
    /// Sealed session grant
    LoginAccepted(LoginResponse),
    /// The request failed; only the category is disclosed
    Rejected {
        /// Error category
        category: String,
        /// Offending fields, for validation failures
        fields: Vec<String>,
    },
    /// Ping
    Ping,
    /// Pong
    Pong,
}

impl GatewayMessage {
    /// Short name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayMessage::GetPublicKey => "get_public_key",
            GatewayMessage::PublicKey { .. } => "public_key",
            GatewayMessage::Login(_) => "login",
            GatewayMessage::LoginAccepted(_) => "login_accepted",
            GatewayMessage::Rejected { .. } => "rejected",
            GatewayMessage::Ping => "ping",
            GatewayMessage::Pong => "pong",
        }
    }
}

/// Abstract transport trait
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a message to the peer
    async fn send(&mut self, message: &GatewayMessage) -> TransportResult<()>;

    /// Receive a message from the peer
    ///
    /// Blocks until a message is available or the connection is closed.
    async fn receive(&mut self) -> TransportResult<GatewayMessage>;

    /// Check if the transport is connected
    fn is_connected(&self) -> bool;

    /// Close the transport
    async fn close(&mut self) -> TransportResult<()>;
}

/// In-memory transport for testing
///
/// Uses channels to simulate a connection between two endpoints.
pub mod memory {
    use super::*;
    use tokio::sync::mpsc;

    /// Create a pair of connected in-memory transports
    pub fn create_pair() -> (MemoryTransport, MemoryTransport) {
        let (tx1, rx1) = mpsc::channel(100);
        let (tx2, rx2) = mpsc::channel(100);

        let transport1 = MemoryTransport {
            tx: tx1,
            rx: rx2,
            connected: true,
        };

        let transport2 = MemoryTransport {
            tx: tx2,
            rx: rx1,
            connected: true,
        };

        (transport1, transport2)
    }

    /// In-memory transport endpoint
    pub struct MemoryTransport {
        tx: mpsc::Sender<GatewayMessage>,
        rx: mpsc::Receiver<GatewayMessage>,
        connected: bool,
    }

    #[async_trait]
    impl Transport for MemoryTransport {
        async fn send(&mut self, message: &GatewayMessage) -> TransportResult<()> {
            if !self.connected {
                return Err(TransportError::Disconnected);
            }

            self.tx
                .send(message.clone())
                .await
                .map_err(|_| TransportError::SendFailed("Channel closed".to_string()))
        }

        async fn receive(&mut self) -> TransportResult<GatewayMessage> {
            if !self.connected {
                return Err(TransportError::Disconnected);
            }

            self.rx.recv().await.ok_or(TransportError::Disconnected)
        }

        fn is_connected(&self) -> bool {
            self.connected
        }

        async fn close(&mut self) -> TransportResult<()> {
            self.connected = false;
            self.rx.close();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_transport() {
        let (mut client, mut server) = memory::create_pair();

        client.send(&GatewayMessage::GetPublicKey).await.unwrap();
        assert_eq!(server.receive().await.unwrap(), GatewayMessage::GetPublicKey);

        server.send(&GatewayMessage::Pong).await.unwrap();
        assert_eq!(client.receive().await.unwrap(), GatewayMessage::Pong);
    }

    #[tokio::test]
    async fn test_memory_transport_close() {
        let (mut client, mut server) = memory::create_pair();

        client.close().await.unwrap();
        assert!(!client.is_connected());
        assert!(client.send(&GatewayMessage::Ping).await.is_err());

        drop(client);
        assert!(matches!(server.receive().await, Err(TransportError::Disconnected)));
    }

    #[test]
    fn test_message_json_shape() {
        let json = serde_json::to_value(GatewayMessage::Rejected {
            category: "validation".into(),
            fields: vec!["nonce".into()],
        })
        .unwrap();

        assert_eq!(json["type"], "Rejected");
        assert_eq!(json["data"]["category"], "validation");
        assert_eq!(json["data"]["fields"][0], "nonce");

        let ping: GatewayMessage = serde_json::from_str(r#"{"type":"Ping"}"#).unwrap();
        assert_eq!(ping, GatewayMessage::Ping);
    }

    #[test]
    fn test_login_message_carries_wire_shape() {
        let request = LoginRequest {
            mic: "bWlj".into(),
            nonce: "bm9uY2U=".into(),
            data: "ZGF0YQ==".into(),
            public_key: "a2V5".into(),
        };
        let json = serde_json::to_value(GatewayMessage::Login(request.clone())).unwrap();

        assert_eq!(json["type"], "Login");
        assert_eq!(json["data"]["publicKey"], "a2V5");

        let parsed: GatewayMessage = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, GatewayMessage::Login(request));
        assert_eq!(parsed.kind(), "login");
    }
}
