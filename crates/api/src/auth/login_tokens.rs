//! Ephemeral login credential store.
//!
//! Holds at most one unclaimed session credential per messaging identity,
//! bridging the bot-side confirmation to the polling web client. The store
//! is an explicitly constructed object injected through [`AppState`]
//! (no process-global map).
//!
//! Concurrency contract: operations on different keys never contend beyond
//! the dashmap shard, and [`claim`](LoginTokenStore::claim) is linearizable
//! per key -- the underlying `remove` takes the entry atomically, so two
//! concurrent claims cannot both obtain the same credential. TTL is enforced
//! by wall-clock comparison on every access; the background sweep exists
//! only for memory hygiene.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use slotbook_core::types::MessengerId;

struct StoredCredential {
    credential: String,
    created_at: Instant,
}

/// Concurrent map of messaging identity -> unclaimed session credential.
pub struct LoginTokenStore {
    entries: DashMap<MessengerId, StoredCredential>,
    ttl: Duration,
}

impl LoginTokenStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    fn expired(&self, entry: &StoredCredential) -> bool {
        entry.created_at.elapsed() > self.ttl
    }

    /// Store a freshly minted credential for the key, overwriting any prior
    /// unclaimed entry.
    pub fn store(&self, key: MessengerId, credential: String) {
        self.entries.insert(
            key,
            StoredCredential {
                credential,
                created_at: Instant::now(),
            },
        );
        tracing::debug!(messenger_id = key, "Login credential stored");
    }

    /// Atomically take the credential for the key.
    ///
    /// Returns `None` for an absent or TTL-expired entry; callers cannot
    /// distinguish the two and treat both as "poll again". A taken entry can
    /// never be yielded a second time.
    pub fn claim(&self, key: MessengerId) -> Option<String> {
        let (_, entry) = self.entries.remove(&key)?;
        if self.expired(&entry) {
            tracing::debug!(messenger_id = key, "Login credential expired at claim");
            return None;
        }
        tracing::debug!(messenger_id = key, "Login credential claimed");
        Some(entry.credential)
    }

    /// Non-destructive peek: is a live credential waiting for this key?
    ///
    /// An expired entry encountered here is lazily deleted and reported
    /// absent.
    pub fn is_pending(&self, key: MessengerId) -> bool {
        let live = self
            .entries
            .get(&key)
            .map(|entry| !self.expired(&entry))
            .unwrap_or(false);
        if !live {
            // Lazy TTL cleanup; re-check under the entry lock so a fresh
            // overwrite racing with us survives.
            self.entries.remove_if(&key, |_, entry| self.expired(entry));
        }
        live
    }

    /// Evict every expired entry. Returns the count evicted.
    ///
    /// The count is taken inside the retain predicate rather than from
    /// before/after lengths: concurrent `store` calls can grow the map
    /// mid-sweep, so a length delta is not a valid eviction count.
    pub fn purge_expired(&self) -> usize {
        let evicted = AtomicUsize::new(0);
        self.entries.retain(|_, entry| {
            let keep = !self.expired(entry);
            if !keep {
                evicted.fetch_add(1, Ordering::Relaxed);
            }
            keep
        });
        evicted.into_inner()
    }
}
