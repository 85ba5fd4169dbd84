//! Replay protection via single-use nonces.
//!
//! Every nonce presented to the server is recorded for a fixed TTL. A nonce
//! already on record is rejected whether or not the request that first
//! carried it succeeded. The check and the insert happen under one lock,
//! so two concurrent presentations of the same nonce cannot both pass.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use tracing::debug;

use crate::clock::{Clock, SystemClock};

/// Entry count above which recording also sweeps expired nonces
const SWEEP_THRESHOLD: usize = 4096;

/// TTL-bounded record of nonces already seen
pub struct NonceGuard {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    seen: Mutex<HashMap<Vec<u8>, SystemTime>>,
}

impl NonceGuard {
    /// Create a guard using the system clock
    ///
    /// `ttl` must exceed the tolerated clock skew plus network latency
    /// of a legitimate request.
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// Create a guard reading time from `clock`
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        NonceGuard {
            ttl,
            clock,
            seen: Mutex::new(HashMap::new()),
        }
    }

    /// Record `nonce` if it is not already on record
    ///
    /// Returns `true` exactly once per nonce within its TTL window. An entry
    /// whose TTL has passed is replaced and counts as fresh again.
    pub fn record_if_fresh(&self, nonce: &[u8]) -> bool {
        let now = self.clock.now();
        let mut seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());

        if seen.len() >= SWEEP_THRESHOLD {
            seen.retain(|_, expires_at| *expires_at > now);
        }

        match seen.get(nonce) {
            Some(expires_at) if *expires_at > now => false,
            _ => {
                seen.insert(nonce.to_vec(), now + self.ttl);
                true
            }
        }
    }

    /// Drop every entry whose TTL has passed; returns how many were dropped
    pub fn evict_expired(&self) -> usize {
        let now = self.clock.now();
        let mut seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());
        let before = seen.len();
        seen.retain(|_, expires_at| *expires_at > now);
        let evicted = before - seen.len();
        if evicted > 0 {
            debug!(evicted, remaining = seen.len(), "evicted expired nonces");
        }
        evicted
    }

    /// Number of nonces on record, expired or not
    pub fn len(&self) -> usize {
        self.seen.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether no nonce is on record
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Configured TTL
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl std::fmt::Debug for NonceGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NonceGuard")
            .field("ttl", &self.ttl)
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::Barrier;
    use std::thread;

    fn guard(ttl_secs: u64) -> (NonceGuard, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let guard = NonceGuard::with_clock(Duration::from_secs(ttl_secs), clock.clone());
        (guard, clock)
    }

    #[test]
    fn test_nonce_fresh_once() {
        let (guard, _) = guard(60);

        assert!(guard.record_if_fresh(b"nonce-a"));
        assert!(!guard.record_if_fresh(b"nonce-a"));
        assert!(!guard.record_if_fresh(b"nonce-a"));
        assert!(guard.record_if_fresh(b"nonce-b"));
    }

    #[test]
    fn test_nonce_reusable_after_ttl() {
        let (guard, clock) = guard(60);

        assert!(guard.record_if_fresh(b"nonce"));
        clock.advance(Duration::from_secs(59));
        assert!(!guard.record_if_fresh(b"nonce"));

        clock.advance(Duration::from_secs(1));
        assert!(guard.record_if_fresh(b"nonce"));
    }

    #[test]
    fn test_evict_expired() {
        let (guard, clock) = guard(10);

        guard.record_if_fresh(b"old");
        clock.advance(Duration::from_secs(5));
        guard.record_if_fresh(b"new");
        clock.advance(Duration::from_secs(6));

        assert_eq!(guard.evict_expired(), 1);
        assert_eq!(guard.len(), 1);
        assert!(!guard.record_if_fresh(b"new"));
    }

    #[test]
    fn test_sweep_on_growth() {
        let (guard, clock) = guard(1);

        for i in 0..SWEEP_THRESHOLD as u32 {
            guard.record_if_fresh(&i.to_le_bytes());
        }
        clock.advance(Duration::from_secs(2));

        assert!(guard.record_if_fresh(b"trigger"));
        assert_eq!(guard.len(), 1);
    }

    #[test]
    fn test_concurrent_same_nonce_exactly_one_fresh() {
        let guard = Arc::new(NonceGuard::new(Duration::from_secs(300)));
        let threads = 16;
        let barrier = Arc::new(Barrier::new(threads));

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let guard = guard.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    guard.record_if_fresh(b"captured-request-nonce")
                })
            })
            .collect();

        let fresh = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|fresh| *fresh)
            .count();

        assert_eq!(fresh, 1);
    }
}
