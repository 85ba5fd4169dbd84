//! Session creation, lookup and pruning.
//!
//! The registry holds no timer. An external scheduler calls
//! [`SessionRegistry::prune_expired`] on a fixed interval; lookups that
//! race with a prune simply see the session as gone.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tracing::{debug, info};

use super::store::{MemorySessionStore, SessionStore};
use super::{Session, SessionError};
use crate::clock::{Clock, SystemClock};
use crate::crypto::{random_bytes, PublicKey};

/// Default lifetime of an issued session
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(10 * 60);

/// Owner of all issued sessions
pub struct SessionRegistry {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl SessionRegistry {
    /// In-memory registry on the system clock
    pub fn new(ttl: Duration) -> Self {
        Self::with_parts(Arc::new(MemorySessionStore::new()), Arc::new(SystemClock), ttl)
    }

    /// Registry over an explicit store and clock
    pub fn with_parts(store: Arc<dyn SessionStore>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        SessionRegistry { store, clock, ttl }
    }

    /// Issue a session for an authenticated client
    ///
    /// The key is fresh and random; `expires_at` is `now + ttl` and never
    /// changes afterwards.
    pub fn create(&self, client_ref: &str, client_public_key: &PublicKey) -> Session {
        let session = Session::new(
            hex::encode(random_bytes::<16>()),
            client_ref.to_string(),
            client_public_key.clone(),
            self.clock.now() + self.ttl,
        );
        self.store.insert(session.clone());

        info!(session_id = %session.id(), client = %client_ref, "session issued");
        session
    }

    /// Look up a live session
    ///
    /// Expired sessions that have not been pruned yet are reported as
    /// not found as well.
    pub fn find(&self, session_id: &str) -> Result<Session, SessionError> {
        let now = self.clock.now();
        match self.store.find(session_id) {
            Some(session) if !session.is_expired(now) => Ok(session),
            Some(_) => {
                debug!(session_id, "session expired");
                Err(SessionError::NotFound)
            }
            None => Err(SessionError::NotFound),
        }
    }

    /// Delete every session with `expires_at < now`; returns the count
    pub fn prune_expired(&self, now: SystemTime) -> usize {
        let expired: Vec<String> = self
            .store
            .find_all()
            .into_iter()
            .filter(|session| session.expires_at() < now)
            .map(|session| session.id().to_string())
            .collect();

        if expired.is_empty() {
            return 0;
        }

        let removed = self.store.delete_many(&expired);
        info!(removed, "pruned expired sessions");
        removed
    }

    /// Withdraw a session whose grant never reached the client
    pub(crate) fn discard(&self, session_id: &str) {
        self.store.delete_many(&[session_id.to_string()]);
        debug!(session_id, "discarded undelivered session");
    }

    /// Configured session lifetime
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The registry's time source
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
