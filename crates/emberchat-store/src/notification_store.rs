// Cache-backed NotificationStore implementation
//
// Owner-facing alert log per widget. Same window mechanics as the event
// store, but keyed by widget alone and numbered in its own id space: a
// notification id says nothing about any session's event ids.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

use emberchat_core::{Notification, NotificationStore, Result};

use crate::cache::TtlCache;

#[derive(Clone)]
struct StoredNotification {
    notification: Notification,
    expires_at: Instant,
}

#[derive(Clone, Default)]
struct WidgetLog {
    next_id: u64,
    notifications: VecDeque<StoredNotification>,
}

impl WidgetLog {
    fn prune(&mut self, now: Instant) {
        while let Some(front) = self.notifications.front() {
            if front.expires_at > now {
                break;
            }
            self.notifications.pop_front();
        }
    }
}

/// Cache-backed notification store with a per-widget TTL window
#[derive(Clone)]
pub struct CacheNotificationStore {
    cache: TtlCache<WidgetLog>,
    ttl: Duration,
}

impl CacheNotificationStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: TtlCache::new(),
            ttl,
        }
    }

    pub async fn purge_expired(&self) -> usize {
        self.cache.purge_expired().await
    }
}

#[async_trait]
impl NotificationStore for CacheNotificationStore {
    async fn append(&self, widget_id: Uuid, event_type: &str, data: Value) -> Result<u64> {
        let event_type = event_type.to_string();
        let ttl = self.ttl;

        let id = self
            .cache
            .update(widget_id.to_string(), ttl, move |current| {
                let now = Instant::now();
                let mut log = current.unwrap_or_default();
                log.prune(now);

                log.next_id += 1;
                let id = log.next_id;
                log.notifications.push_back(StoredNotification {
                    notification: Notification {
                        id,
                        event_type,
                        data,
                    },
                    expires_at: now + ttl,
                });
                (log, id)
            })
            .await;

        Ok(id)
    }

    async fn notifications_since(
        &self,
        widget_id: Uuid,
        after_id: u64,
    ) -> Result<Vec<Notification>> {
        let Some(log) = self.cache.get(&widget_id.to_string()).await else {
            return Ok(Vec::new());
        };

        let now = Instant::now();
        Ok(log
            .notifications
            .iter()
            .filter(|stored| stored.expires_at > now && stored.notification.id > after_id)
            .map(|stored| stored.notification.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::time::advance;

    #[tokio::test(start_paused = true)]
    async fn test_notifications_numbered_per_widget() {
        let store = CacheNotificationStore::new(Duration::from_secs(3600));
        let (w1, w2) = (Uuid::now_v7(), Uuid::now_v7());

        assert_eq!(
            store.append(w1, "human_requested", json!({})).await.unwrap(),
            1
        );
        assert_eq!(
            store.append(w1, "human_requested", json!({})).await.unwrap(),
            2
        );
        assert_eq!(
            store.append(w2, "human_requested", json!({})).await.unwrap(),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_notifications_since() {
        let store = CacheNotificationStore::new(Duration::from_secs(3600));
        let w = Uuid::now_v7();
        for n in 1..=3 {
            store
                .append(w, "human_requested", json!({ "n": n }))
                .await
                .unwrap();
        }

        let notifications = store.notifications_since(w, 1).await.unwrap();
        assert_eq!(
            notifications.iter().map(|n| n.id).collect::<Vec<_>>(),
            vec![2, 3]
        );
        assert!(store.notifications_since(w, 3).await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_log_expires() {
        let store = CacheNotificationStore::new(Duration::from_secs(60));
        let w = Uuid::now_v7();
        store.append(w, "human_requested", json!({})).await.unwrap();

        advance(Duration::from_secs(61)).await;
        assert!(store.notifications_since(w, 0).await.unwrap().is_empty());
    }
}
