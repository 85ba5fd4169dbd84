//! Using an issued session key after login.

mod common;

use std::time::Duration;

use common::{Harness, CLIENT_ID, PASSWORD};
use ledgerseal::{AuthError, SessionGrant};

fn login(harness: &Harness) -> SessionGrant {
    let client = harness.client();
    let request = client.seal_login(CLIENT_ID, PASSWORD).unwrap();
    client
        .open_grant(&harness.handshake.login(&request).unwrap())
        .unwrap()
}

#[test]
fn test_request_response_under_session_key() {
    let harness = Harness::new();
    let grant = login(&harness);

    let request = grant.seal_request(br#"{"op":"balance","account":"acc-1"}"#).unwrap();
    let (session, body) = harness.channel.open_request(&request).unwrap();

    assert_eq!(session.client_ref(), CLIENT_ID);
    assert_eq!(body, br#"{"op":"balance","account":"acc-1"}"#);

    let response = harness.channel.seal_response(&session, br#"{"balance":"1200.00"}"#).unwrap();
    assert_eq!(grant.open_response(&response).unwrap(), br#"{"balance":"1200.00"}"#);
}

#[test]
fn test_replayed_request_rejected() {
    let harness = Harness::new();
    let grant = login(&harness);
    let request = grant.seal_request(b"transfer 100 acc-1 acc-2").unwrap();

    assert!(harness.channel.open_request(&request).is_ok());
    assert_eq!(
        harness.channel.open_request(&request).unwrap_err(),
        AuthError::Replay
    );
}

#[test]
fn test_tampered_request_rejected() {
    let harness = Harness::new();
    let grant = login(&harness);
    let mut request = grant.seal_request(b"transfer 100 acc-1 acc-2").unwrap();
    request.data = {
        use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
        let mut data = BASE64.decode(&request.data).unwrap();
        data[0] ^= 0x20;
        BASE64.encode(data)
    };

    assert_eq!(
        harness.channel.open_request(&request).unwrap_err(),
        AuthError::Integrity
    );
}

#[test]
fn test_requests_fail_once_session_expires() {
    let harness = Harness::new();
    let grant = login(&harness);

    harness.clock.advance(Duration::from_secs(10 * 60 + 1));
    let request = grant.seal_request(b"balance").unwrap();

    assert_eq!(
        harness.channel.open_request(&request).unwrap_err(),
        AuthError::SessionNotFound
    );
}
