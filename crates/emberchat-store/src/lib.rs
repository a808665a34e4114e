// Cache storage layer
//
// This crate provides the cache-backed implementations of the core store
// traits:
// - CacheEventStore: per-(widget, session) event log with a shared TTL window
// - CacheTypingStore: last-writer-wins typing indicator
// - CacheNotificationStore: per-widget owner-facing alert log
//
// The backing primitive is TtlCache, a process-local key-value map with
// per-entry deadlines. All three stores are constructed from StoreConfig at
// process start and shared via Arc.

pub mod cache;
pub mod config;
pub mod event_store;
pub mod notification_store;
pub mod typing_store;

pub use cache::TtlCache;
pub use config::StoreConfig;
pub use event_store::CacheEventStore;
pub use notification_store::CacheNotificationStore;
pub use typing_store::CacheTypingStore;

use std::sync::Arc;

/// The three shared stores, built together from one config
#[derive(Clone)]
pub struct Stores {
    pub events: Arc<CacheEventStore>,
    pub typing: Arc<CacheTypingStore>,
    pub notifications: Arc<CacheNotificationStore>,
}

impl Stores {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            events: Arc::new(CacheEventStore::new(config.event_ttl)),
            typing: Arc::new(CacheTypingStore::new(config.typing_ttl)),
            notifications: Arc::new(CacheNotificationStore::new(config.notification_ttl)),
        }
    }

    /// Sweep expired windows out of all three stores, returning the total
    /// number of entries dropped. Intended for a periodic janitor task.
    pub async fn purge_expired(&self) -> usize {
        self.events.purge_expired().await
            + self.typing.purge_expired().await
            + self.notifications.purge_expired().await
    }
}
