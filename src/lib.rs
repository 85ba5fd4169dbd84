//! # ledgerseal
//!
//! Sealed login handshake and short-lived session keys for financial
//! clients, without relying on transport-layer security.
//!
//! ## Features
//!
//! - **Hybrid envelopes**: RSA-OAEP for the login, XChaCha20-Poly1305 for
//!   everything after it
//! - **Keyed integrity tags** over every transmitted field
//! - **Replay protection** with single-use nonces, even for failed logins
//! - **Session keys** with a fixed ten-minute lifetime and no extension
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use ledgerseal::handshake::{Client, LoginClient, LoginHandshake, MemoryClientDirectory};
//! use ledgerseal::{KeyManager, NonceGuard, SessionRegistry};
//!
//! let server_keys = Arc::new(KeyManager::generate().unwrap());
//! let clients = MemoryClientDirectory::from_clients([Client::with_password("acme", "pw")]);
//! let handshake = LoginHandshake::new(
//!     server_keys.clone(),
//!     Arc::new(NonceGuard::new(Duration::from_secs(300))),
//!     Arc::new(SessionRegistry::new(Duration::from_secs(600))),
//!     Arc::new(clients),
//! );
//!
//! // Client side
//! let client = LoginClient::new(
//!     server_keys.public_key().clone(),
//!     Arc::new(KeyManager::generate().unwrap()),
//! );
//! let request = client.seal_login("acme", "pw").unwrap();
//!
//! let response = handshake.login(&request).unwrap();
//! let grant = client.open_grant(&response).unwrap();
//! println!("session {}", grant.session_id());
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              APPLICATION LAYER              │
//! │        gateway binary  |  CLI client        │
//! └─────────────────────┬───────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────┐
//! │              PROTOCOL LAYER                 │
//! │  LoginHandshake | SessionChannel | wire     │
//! └─────────────────────┬───────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────┐
//! │                STATE LAYER                  │
//! │  KeyManager | NonceGuard | SessionRegistry  │
//! └─────────────────────┬───────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────┐
//! │               CRYPTO LAYER                  │
//! │  RSA-OAEP | XChaCha20-Poly1305 | BLAKE3     │
//! └─────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod config;
pub mod crypto;
pub mod error;
pub mod handshake;
pub mod keys;
pub mod replay;
pub mod session;
pub mod transport;
pub mod wire;

#[cfg(test)]
mod testkeys;

// Re-export main types at crate root
pub use crypto::{CryptoError, CryptoResult, ProtectedEnvelope, ProtectionCodec, PublicKey};
pub use error::{AuthError, AuthResult};
pub use handshake::{LoginClient, LoginHandshake, SessionGrant};
pub use keys::KeyManager;
pub use replay::NonceGuard;
pub use session::{Session, SessionChannel, SessionRegistry};
