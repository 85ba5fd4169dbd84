//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use ledgerseal::clock::ManualClock;
use ledgerseal::handshake::{Client, LoginClient, LoginHandshake, MemoryClientDirectory};
use ledgerseal::session::{MemorySessionStore, SessionRegistry, DEFAULT_SESSION_TTL};
use ledgerseal::{KeyManager, NonceGuard, SessionChannel};

pub const CLIENT_ID: &str = "acme-treasury";
pub const PASSWORD: &str = "correct horse battery staple";

static SERVER_KEYS: OnceLock<Arc<KeyManager>> = OnceLock::new();
static CLIENT_KEYS: OnceLock<Arc<KeyManager>> = OnceLock::new();

pub fn server_keys() -> Arc<KeyManager> {
    SERVER_KEYS
        .get_or_init(|| Arc::new(KeyManager::generate().unwrap()))
        .clone()
}

pub fn client_keys() -> Arc<KeyManager> {
    CLIENT_KEYS
        .get_or_init(|| Arc::new(KeyManager::generate().unwrap()))
        .clone()
}

pub struct Harness {
    pub handshake: Arc<LoginHandshake>,
    pub channel: SessionChannel,
    pub sessions: Arc<SessionRegistry>,
    pub nonces: Arc<NonceGuard>,
    pub store: Arc<MemorySessionStore>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::default());
        let store = Arc::new(MemorySessionStore::new());
        let sessions = Arc::new(SessionRegistry::with_parts(
            store.clone(),
            clock.clone(),
            DEFAULT_SESSION_TTL,
        ));
        let nonces = Arc::new(NonceGuard::with_clock(Duration::from_secs(300), clock.clone()));
        let clients = Arc::new(MemoryClientDirectory::from_clients([Client::with_password(
            CLIENT_ID, PASSWORD,
        )]));

        Harness {
            handshake: Arc::new(LoginHandshake::new(
                server_keys(),
                nonces.clone(),
                sessions.clone(),
                clients,
            )),
            channel: SessionChannel::new(sessions.clone(), nonces.clone()),
            sessions,
            nonces,
            store,
            clock,
        }
    }

    pub fn client(&self) -> LoginClient {
        LoginClient::new(self.handshake.public_key().clone(), client_keys())
    }
}
