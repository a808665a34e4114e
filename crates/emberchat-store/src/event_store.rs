// Cache-backed EventStore implementation
//
// One cache entry per (widget, session) stream holds the monotonic counter
// and the live events together, so the counter and the entries share a
// single TTL window: a stream idle past the window disappears wholesale
// (counter included, so ids restart at 1 for a fresh window), and
// individual events age out of the window silently. Loss under expiry is
// the documented contract, never an error.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

use emberchat_core::{EventStore, Result, WidgetEvent};

use crate::cache::TtlCache;

#[derive(Clone)]
struct StoredEvent {
    event: WidgetEvent,
    expires_at: Instant,
}

#[derive(Clone, Default)]
struct StreamEntry {
    next_id: u64,
    events: VecDeque<StoredEvent>,
}

impl StreamEntry {
    fn prune(&mut self, now: Instant) {
        while let Some(front) = self.events.front() {
            if front.expires_at > now {
                break;
            }
            self.events.pop_front();
        }
    }
}

/// Cache-backed event store with a per-stream TTL window
#[derive(Clone)]
pub struct CacheEventStore {
    cache: TtlCache<StreamEntry>,
    ttl: Duration,
}

impl CacheEventStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: TtlCache::new(),
            ttl,
        }
    }

    /// Drop streams idle past the TTL window (janitor sweep)
    pub async fn purge_expired(&self) -> usize {
        self.cache.purge_expired().await
    }

    fn stream_key(widget_id: Uuid, session_id: Uuid) -> String {
        format!("{widget_id}:{session_id}")
    }
}

#[async_trait]
impl EventStore for CacheEventStore {
    async fn append(
        &self,
        widget_id: Uuid,
        session_id: Uuid,
        event_type: &str,
        data: Value,
    ) -> Result<u64> {
        let key = Self::stream_key(widget_id, session_id);
        let event_type = event_type.to_string();
        let ttl = self.ttl;

        let id = self
            .cache
            .update(key, ttl, move |current| {
                let now = Instant::now();
                let mut stream = current.unwrap_or_default();
                stream.prune(now);

                stream.next_id += 1;
                let id = stream.next_id;
                stream.events.push_back(StoredEvent {
                    event: WidgetEvent {
                        id,
                        event_type,
                        data,
                    },
                    expires_at: now + ttl,
                });
                (stream, id)
            })
            .await;

        Ok(id)
    }

    async fn events_since(
        &self,
        widget_id: Uuid,
        session_id: Uuid,
        after_id: u64,
    ) -> Result<Vec<WidgetEvent>> {
        let key = Self::stream_key(widget_id, session_id);
        let Some(stream) = self.cache.get(&key).await else {
            return Ok(Vec::new());
        };

        let now = Instant::now();
        Ok(stream
            .events
            .iter()
            .filter(|stored| stored.expires_at > now && stored.event.id > after_id)
            .map(|stored| stored.event.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::time::advance;

    fn store() -> CacheEventStore {
        CacheEventStore::new(Duration::from_secs(3600))
    }

    #[tokio::test(start_paused = true)]
    async fn test_ids_increase_by_one_from_one() {
        let store = store();
        let (w, s) = (Uuid::now_v7(), Uuid::now_v7());

        for expected in 1..=5u64 {
            let id = store.append(w, s, "message", json!({})).await.unwrap();
            assert_eq!(id, expected);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_streams_have_independent_counters() {
        let store = store();
        let w = Uuid::now_v7();
        let (s1, s2) = (Uuid::now_v7(), Uuid::now_v7());

        assert_eq!(store.append(w, s1, "a", json!({})).await.unwrap(), 1);
        assert_eq!(store.append(w, s1, "b", json!({})).await.unwrap(), 2);
        assert_eq!(store.append(w, s2, "c", json!({})).await.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_since_returns_exact_suffix() {
        let store = store();
        let (w, s) = (Uuid::now_v7(), Uuid::now_v7());
        for n in 1..=4 {
            store
                .append(w, s, "message", json!({ "n": n }))
                .await
                .unwrap();
        }

        let events = store.events_since(w, s, 2).await.unwrap();
        assert_eq!(events.iter().map(|e| e.id).collect::<Vec<_>>(), vec![3, 4]);
        assert_eq!(events[0].data["n"], 3);

        // Idempotent: same cursor, same suffix
        let again = store.events_since(w, s, 2).await.unwrap();
        assert_eq!(again.len(), 2);
        assert_eq!(again[0].id, 3);

        // Caught up
        assert!(store.events_since(w, s, 4).await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_stream_reads_empty() {
        let store = store();
        let events = store
            .events_since(Uuid::now_v7(), Uuid::now_v7(), 0)
            .await
            .unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_stream_expires_wholesale() {
        let store = CacheEventStore::new(Duration::from_secs(60));
        let (w, s) = (Uuid::now_v7(), Uuid::now_v7());
        store.append(w, s, "message", json!({})).await.unwrap();
        store.append(w, s, "message", json!({})).await.unwrap();

        advance(Duration::from_secs(61)).await;

        // Window gone: reads are silently empty, counter restarts at 1
        assert!(store.events_since(w, s, 0).await.unwrap().is_empty());
        assert_eq!(store.append(w, s, "message", json!({})).await.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_old_events_age_out_while_stream_lives() {
        let store = CacheEventStore::new(Duration::from_secs(60));
        let (w, s) = (Uuid::now_v7(), Uuid::now_v7());

        store.append(w, s, "message", json!({ "n": 1 })).await.unwrap();
        advance(Duration::from_secs(40)).await;
        store.append(w, s, "message", json!({ "n": 2 })).await.unwrap();
        advance(Duration::from_secs(40)).await;

        // First event is past its deadline, second append kept the window open
        let events = store.events_since(w, s, 0).await.unwrap();
        assert_eq!(events.iter().map(|e| e.id).collect::<Vec<_>>(), vec![2]);

        // Counter survives: the next id does not reuse 1 or 2
        assert_eq!(store.append(w, s, "message", json!({})).await.unwrap(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired_sweeps_idle_streams() {
        let store = CacheEventStore::new(Duration::from_secs(60));
        store
            .append(Uuid::now_v7(), Uuid::now_v7(), "message", json!({}))
            .await
            .unwrap();

        advance(Duration::from_secs(61)).await;
        assert_eq!(store.purge_expired().await, 1);
    }
}
