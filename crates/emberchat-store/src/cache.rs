// TTL key-value cache primitive
//
// The storage primitive the three stores are built on: a process-local
// key-value map where every entry carries a deadline. Expired entries read
// as absent; they are dropped when their key is next written or when the
// janitor sweep runs. All mutations take the write lock, which gives each
// key atomic read-modify-write and read-after-write visibility.
//
// Deadlines use tokio::time::Instant so tests can drive expiry with paused
// time (#[tokio::test(start_paused = true)]).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// Shared TTL cache, cloneable handle over one map
pub struct TtlCache<V> {
    entries: Arc<RwLock<HashMap<String, Entry<V>>>>,
}

impl<V> Clone for TtlCache<V> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<V> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<V: Clone + Send + Sync> TtlCache<V> {
    /// Current value for a key, or None if absent or past its deadline
    pub async fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value.clone())
    }

    /// Store a value with a fresh TTL, replacing any previous entry
    pub async fn insert(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.into(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Atomically read-modify-write one key.
    ///
    /// `f` sees None when the key is absent or expired, and returns the new
    /// value plus a result passed back to the caller. The entry's deadline
    /// is refreshed to now + ttl on every update.
    pub async fn update<T>(
        &self,
        key: impl Into<String>,
        ttl: Duration,
        f: impl FnOnce(Option<V>) -> (V, T),
    ) -> T {
        let key = key.into();
        let mut entries = self.entries.write().await;
        let now = Instant::now();
        let current = entries
            .remove(&key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.value);
        let (value, result) = f(current);
        entries.insert(
            key,
            Entry {
                value,
                expires_at: now + ttl,
            },
        );
        result
    }

    pub async fn remove(&self, key: &str) {
        self.entries.write().await.remove(key);
    }

    /// Drop every entry past its deadline, returning how many were removed
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    /// Number of live (unexpired) entries
    pub async fn len(&self) -> usize {
        let entries = self.entries.read().await;
        let now = Instant::now();
        entries
            .values()
            .filter(|entry| entry.expires_at > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
