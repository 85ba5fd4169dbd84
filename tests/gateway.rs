//! The gateway protocol over in-memory and WebSocket transports.

mod common;

use common::{client_keys, Harness, CLIENT_ID, PASSWORD};
use ledgerseal::handshake::LoginClient;
use ledgerseal::transport::{
    memory, serve_connection, GatewayClient, GatewayMessage, Transport, TransportError,
    WebSocketTransport,
};
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;

#[tokio::test]
async fn test_login_through_memory_gateway() {
    let harness = Harness::new();
    let (client_end, server_end) = memory::create_pair();
    let server = tokio::spawn(serve_connection(server_end, harness.handshake.clone()));

    let mut gateway = GatewayClient::new(client_end);
    let server_key = gateway.fetch_public_key().await.unwrap();
    let client = LoginClient::new(server_key, client_keys());

    let response = gateway
        .login(client.seal_login(CLIENT_ID, PASSWORD).unwrap())
        .await
        .unwrap();
    let grant = client.open_grant(&response).unwrap();
    assert!(harness.sessions.find(grant.session_id()).is_ok());

    drop(gateway);
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_rejection_carries_only_category() {
    let harness = Harness::new();
    let (client_end, server_end) = memory::create_pair();
    let server = tokio::spawn(serve_connection(server_end, harness.handshake.clone()));

    let mut gateway = GatewayClient::new(client_end);
    let client = harness.client();

    match gateway.login(client.seal_login("nobody", PASSWORD).unwrap()).await {
        Err(TransportError::Rejected { category, fields }) => {
            assert_eq!(category, "authentication");
            assert!(fields.is_empty());
        }
        other => panic!("expected rejection, got {other:?}"),
    }

    let mut request = client.seal_login(CLIENT_ID, PASSWORD).unwrap();
    request.nonce = "AAAA".into();
    match gateway.login(request).await {
        Err(TransportError::Rejected { category, fields }) => {
            assert_eq!(category, "validation");
            assert_eq!(fields, vec!["nonce".to_string()]);
        }
        other => panic!("expected rejection, got {other:?}"),
    }

    drop(gateway);
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_login_over_websocket() {
    let harness = Harness::new();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handshake = harness.handshake.clone();
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let ws = accept_async(stream).await.unwrap();
        serve_connection(WebSocketTransport::from_stream(ws), handshake).await
    });

    let transport = WebSocketTransport::connect(&format!("ws://{addr}")).await.unwrap();
    let mut gateway = GatewayClient::new(transport);
    gateway.ping().await.unwrap();

    let client = LoginClient::new(gateway.fetch_public_key().await.unwrap(), client_keys());
    let grant = client
        .open_grant(
            &gateway
                .login(client.seal_login(CLIENT_ID, PASSWORD).unwrap())
                .await
                .unwrap(),
        )
        .unwrap();
    assert_eq!(harness.store.len(), 1);
    assert!(!grant.session_id().is_empty());

    gateway.close().await.unwrap();
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_garbage_frame_does_not_end_connection() {
    use futures_util::SinkExt;
    use tokio_tungstenite::{connect_async, tungstenite::Message};

    let harness = Harness::new();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handshake = harness.handshake.clone();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let ws = accept_async(stream).await.unwrap();
        serve_connection(WebSocketTransport::from_stream(ws), handshake).await
    });

    let (mut ws, _) = connect_async(format!("ws://{addr}")).await.unwrap();
    ws.send(Message::Text("not json".into())).await.unwrap();

    let mut transport = WebSocketTransport::from_stream(ws);
    assert_eq!(
        transport.receive().await.unwrap(),
        GatewayMessage::Rejected {
            category: "validation".into(),
            fields: vec!["message".into()],
        }
    );

    transport.send(&GatewayMessage::Ping).await.unwrap();
    assert_eq!(transport.receive().await.unwrap(), GatewayMessage::Pong);
}
