//! Gateway message loop and its client.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{GatewayMessage, Transport, TransportError, TransportResult};
use crate::crypto::PublicKey;
use crate::error::AuthError;
use crate::handshake::LoginHandshake;
use crate::wire::{LoginRequest, LoginResponse};

/// Serve one connection until the peer goes away
///
/// Undecodable frames are answered with a validation rejection and the
/// loop keeps going; only transport failures end it with an error.
pub async fn serve_connection<T: Transport>(
    mut transport: T,
    handshake: Arc<LoginHandshake>,
) -> TransportResult<()> {
    loop {
        let message = match transport.receive().await {
            Ok(message) => message,
            Err(TransportError::Disconnected) => {
                debug!("peer disconnected");
                return Ok(());
            }
            Err(TransportError::InvalidData(e)) => {
                warn!(error = %e, "undecodable message");
                transport.send(&rejection(&AuthError::validation(["message"]))).await?;
                continue;
            }
            Err(e) => return Err(e),
        };

        debug!(kind = message.kind(), "received");
        let reply = match message {
            GatewayMessage::GetPublicKey => match handshake.keys().export_public_key_base64() {
                Ok(key) => GatewayMessage::PublicKey { key },
                Err(e) => rejection(&AuthError::from(e)),
            },
            GatewayMessage::Login(request) => {
                match handshake.clone().login_offloaded(request).await {
                    Ok(response) => {
                        info!("login accepted");
                        GatewayMessage::LoginAccepted(response)
                    }
                    Err(e) => rejection(&e),
                }
            }
            GatewayMessage::Ping => GatewayMessage::Pong,
            other => {
                warn!(kind = other.kind(), "client sent a server-only message");
                rejection(&AuthError::validation(["type"]))
            }
        };

        transport.send(&reply).await?;
    }
}

fn rejection(err: &AuthError) -> GatewayMessage {
    GatewayMessage::Rejected {
        category: err.category().to_string(),
        fields: err.fields().to_vec(),
    }
}

/// Client side of the gateway protocol
pub struct GatewayClient<T> {
    transport: T,
}

impl<T: Transport> GatewayClient<T> {
    /// Wrap a connected transport
    pub fn new(transport: T) -> Self {
        GatewayClient { transport }
    }

    /// Fetch and decode the server public key
    pub async fn fetch_public_key(&mut self) -> TransportResult<PublicKey> {
        match self.exchange(&GatewayMessage::GetPublicKey).await? {
            GatewayMessage::PublicKey { key } => {
                PublicKey::from_base64(&key).map_err(|e| TransportError::InvalidData(e.to_string()))
            }
            other => Err(unexpected(other)),
        }
    }

    /// Submit a sealed login
    pub async fn login(&mut self, request: LoginRequest) -> TransportResult<LoginResponse> {
        match self.exchange(&GatewayMessage::Login(request)).await? {
            GatewayMessage::LoginAccepted(response) => Ok(response),
            other => Err(unexpected(other)),
        }
    }

    /// Round-trip a ping
    pub async fn ping(&mut self) -> TransportResult<()> {
        match self.exchange(&GatewayMessage::Ping).await? {
            GatewayMessage::Pong => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// Close the underlying transport
    pub async fn close(&mut self) -> TransportResult<()> {
        self.transport.close().await
    }

    async fn exchange(&mut self, message: &GatewayMessage) -> TransportResult<GatewayMessage> {
        self.transport.send(message).await?;
        match self.transport.receive().await? {
            GatewayMessage::Rejected { category, fields } => {
                Err(TransportError::Rejected { category, fields })
            }
            reply => Ok(reply),
        }
    }
}

fn unexpected(message: GatewayMessage) -> TransportError {
    TransportError::UnexpectedMessage(message.kind().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handshake::{Client, LoginClient, MemoryClientDirectory};
    use crate::replay::NonceGuard;
    use crate::session::{SessionRegistry, DEFAULT_SESSION_TTL};
    use crate::testkeys;
    use crate::transport::memory;
    use std::time::Duration;

    fn handshake() -> Arc<LoginHandshake> {
        Arc::new(LoginHandshake::new(
            testkeys::server_arc().clone(),
            Arc::new(NonceGuard::new(Duration::from_secs(300))),
            Arc::new(SessionRegistry::new(DEFAULT_SESSION_TTL)),
            Arc::new(MemoryClientDirectory::from_clients([Client::with_password(
                "c-1", "pw",
            )])),
        ))
    }

    #[tokio::test]
    async fn test_login_over_memory_transport() {
        let (client_end, server_end) = memory::create_pair();
        let server = tokio::spawn(serve_connection(server_end, handshake()));
        let mut gateway = GatewayClient::new(client_end);

        gateway.ping().await.unwrap();
        let server_key = gateway.fetch_public_key().await.unwrap();
        assert_eq!(&server_key, testkeys::server().public_key());

        let login = LoginClient::new(server_key, testkeys::client_arc().clone());
        let request = login.seal_login("c-1", "pw").unwrap();
        let grant = login
            .open_grant(&gateway.login(request.clone()).await.unwrap())
            .unwrap();
        assert!(!grant.session_id().is_empty());

        match gateway.login(request).await {
            Err(TransportError::Rejected { category, fields }) => {
                assert_eq!(category, "replay");
                assert!(fields.is_empty());
            }
            other => panic!("expected rejection, got {other:?}"),
        }

        drop(gateway);
        server.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_server_only_message_rejected() {
        let (mut client_end, server_end) = memory::create_pair();
        let server = tokio::spawn(serve_connection(server_end, handshake()));

        client_end.send(&GatewayMessage::Pong).await.unwrap();
        assert_eq!(
            client_end.receive().await.unwrap(),
            GatewayMessage::Rejected {
                category: "validation".into(),
                fields: vec!["type".into()],
            }
        );

        drop(client_end);
        server.await.unwrap().unwrap();
    }
}
