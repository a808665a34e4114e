// Cache-backed TypingStore implementation
//
// Last-writer-wins: one TypingSignal per (widget, session), overwritten on
// every write. The short TTL is the clear mechanism: a typist who stalls
// simply stops showing as typing, no explicit clear call exists.

use async_trait::async_trait;
use std::time::Duration;
use uuid::Uuid;

use emberchat_core::{Result, TypingSignal, TypingStore};

use crate::cache::TtlCache;

/// Cache-backed typing indicator store
#[derive(Clone)]
pub struct CacheTypingStore {
    cache: TtlCache<TypingSignal>,
    ttl: Duration,
}

impl CacheTypingStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: TtlCache::new(),
            ttl,
        }
    }

    pub async fn purge_expired(&self) -> usize {
        self.cache.purge_expired().await
    }

    fn key(widget_id: Uuid, session_id: Uuid) -> String {
        format!("{widget_id}:{session_id}")
    }
}

#[async_trait]
impl TypingStore for CacheTypingStore {
    async fn set_typing(
        &self,
        widget_id: Uuid,
        session_id: Uuid,
        operator_id: Option<Uuid>,
    ) -> Result<()> {
        let signal = TypingSignal {
            timestamp: chrono::Utc::now().timestamp() as u64,
            operator_id,
        };
        self.cache
            .insert(Self::key(widget_id, session_id), signal, self.ttl)
            .await;
        Ok(())
    }

    async fn typing(&self, widget_id: Uuid, session_id: Uuid) -> Result<Option<TypingSignal>> {
        Ok(self.cache.get(&Self::key(widget_id, session_id)).await)
    }
}
