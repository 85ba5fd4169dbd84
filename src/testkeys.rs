//! Shared RSA keys for unit tests; generating them per test is too slow.

use std::sync::{Arc, OnceLock};

use crate::keys::KeyManager;

static SERVER: OnceLock<Arc<KeyManager>> = OnceLock::new();
static CLIENT: OnceLock<Arc<KeyManager>> = OnceLock::new();

pub(crate) fn server() -> &'static KeyManager {
    server_arc()
}

pub(crate) fn server_arc() -> &'static Arc<KeyManager> {
    SERVER.get_or_init(|| Arc::new(KeyManager::generate().unwrap()))
}

pub(crate) fn client() -> &'static KeyManager {
    client_arc()
}

pub(crate) fn client_arc() -> &'static Arc<KeyManager> {
    CLIENT.get_or_init(|| Arc::new(KeyManager::generate().unwrap()))
}
