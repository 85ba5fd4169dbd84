//! Credential lookup for the login handshake.

use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::hash::constant_time_eq;
use crate::crypto::ProtectionCodec;

/// Errors loading a client directory
#[derive(Error, Debug)]
pub enum DirectoryError {
    /// The file could not be read
    #[error("Failed to read client file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a JSON list of clients
    #[error("Invalid client file: {0}")]
    Format(#[from] serde_json::Error),
}

/// A registered client: `{ id, passwordHash }`
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    /// Opaque client identifier
    pub id: String,
    /// Hex BLAKE3 digest of the password
    pub password_hash: String,
}

impl Client {
    /// Register a client from a cleartext password
    pub fn with_password(id: impl Into<String>, password: &str) -> Self {
        Client {
            id: id.into(),
            password_hash: hex::encode(ProtectionCodec::digest(password.as_bytes())),
        }
    }

    /// Check a presented password against the stored hash in constant time
    ///
    /// A malformed stored hash never matches.
    pub fn verify_password(&self, password: &str) -> bool {
        match hex::decode(&self.password_hash) {
            Ok(stored) => constant_time_eq(&ProtectionCodec::digest(password.as_bytes()), &stored),
            Err(_) => false,
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Lookup of registered clients by id
pub trait ClientDirectory: Send + Sync {
    /// Find a client, or `None` if the id is unknown
    fn find_client_by_id(&self, id: &str) -> Option<Client>;
}

/// Process-local client directory
#[derive(Debug, Default)]
pub struct MemoryClientDirectory {
    clients: RwLock<HashMap<String, Client>>,
}

impl MemoryClientDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a directory from a list of clients; later duplicates win
    pub fn from_clients(clients: impl IntoIterator<Item = Client>) -> Self {
        let directory = Self::new();
        for client in clients {
            directory.insert(client);
        }
        directory
    }

    /// Load `[{ "id": ..., "passwordHash": ... }]` from a JSON file
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, DirectoryError> {
        let contents = std::fs::read_to_string(path)?;
        let clients: Vec<Client> = serde_json::from_str(&contents)?;
        Ok(Self::from_clients(clients))
    }

    /// Add or replace a client
    pub fn insert(&self, client: Client) {
        let mut clients = self.clients.write().unwrap_or_else(|e| e.into_inner());
        clients.insert(client.id.clone(), client);
    }

    /// Number of registered clients
    pub fn len(&self) -> usize {
        self.clients.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether no client is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ClientDirectory for MemoryClientDirectory {
    fn find_client_by_id(&self, id: &str) -> Option<Client> {
        let clients = self.clients.read().unwrap_or_else(|e| e.into_inner());
        clients.get(id).cloned()
    }
}
