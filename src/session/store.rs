//! Session persistence seam.
//!
//! The registry only needs insert, point lookup, bulk delete and a full
//! scan for pruning. The in-memory store is what the gateway and the tests
//! run on; a database-backed store implements the same trait.

use std::collections::HashMap;
use std::sync::RwLock;

use super::Session;

/// Storage for issued sessions
pub trait SessionStore: Send + Sync {
    /// Store a newly created session
    fn insert(&self, session: Session);

    /// Look up a session by id, expired or not
    fn find(&self, id: &str) -> Option<Session>;

    /// Delete the given ids; returns how many existed
    fn delete_many(&self, ids: &[String]) -> usize;

    /// Every stored session
    fn find_all(&self) -> Vec<Session>;
}

/// Process-local session store
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemorySessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions
    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemorySessionStore {
    fn insert(&self, session: Session) {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        sessions.insert(session.id().to_string(), session);
    }

    fn find(&self, id: &str) -> Option<Session> {
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        sessions.get(id).cloned()
    }

    fn delete_many(&self, ids: &[String]) -> usize {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        ids.iter().filter(|id| sessions.remove(id.as_str()).is_some()).count()
    }

    fn find_all(&self) -> Vec<Session> {
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        sessions.values().cloned().collect()
    }
}
