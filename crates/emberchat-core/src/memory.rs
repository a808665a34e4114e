// In-memory directory implementations
//
// These keep widgets and sessions in process memory, making them the
// default backend for the API binary (identity persistence is delegated to
// the platform's account service in deployment) and for unit tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::Result;
use crate::session::WidgetSession;
use crate::traits::{SessionDirectory, WidgetDirectory};
use crate::widget::Widget;

// ============================================================================
// InMemoryWidgetDirectory
// ============================================================================

/// In-memory widget directory keyed by widget id
#[derive(Debug, Default, Clone)]
pub struct InMemoryWidgetDirectory {
    widgets: Arc<RwLock<HashMap<Uuid, Widget>>>,
}

impl InMemoryWidgetDirectory {
    pub fn new() -> Self {
        Self {
            widgets: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Pre-populate with a widget (useful for testing)
    pub async fn seed(&self, widget: Widget) {
        self.widgets.write().await.insert(widget.id, widget);
    }
}

#[async_trait]
impl WidgetDirectory for InMemoryWidgetDirectory {
    async fn create(&self, widget: Widget) -> Result<Widget> {
        self.widgets
            .write()
            .await
            .insert(widget.id, widget.clone());
        Ok(widget)
    }

    async fn get(&self, widget_id: Uuid) -> Result<Option<Widget>> {
        Ok(self.widgets.read().await.get(&widget_id).cloned())
    }
}

// ============================================================================
// InMemorySessionDirectory
// ============================================================================

/// In-memory session directory keyed by session id
#[derive(Debug, Default, Clone)]
pub struct InMemorySessionDirectory {
    sessions: Arc<RwLock<HashMap<Uuid, WidgetSession>>>,
}

impl InMemorySessionDirectory {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Pre-populate with a session (useful for testing)
    pub async fn seed(&self, session: WidgetSession) {
        self.sessions.write().await.insert(session.id, session);
    }
}

#[async_trait]
impl SessionDirectory for InMemorySessionDirectory {
    async fn create(&self, session: WidgetSession) -> Result<WidgetSession> {
        self.sessions
            .write()
            .await
            .insert(session.id, session.clone());
        Ok(session)
    }

    async fn get(&self, session_id: Uuid) -> Result<Option<WidgetSession>> {
        Ok(self.sessions.read().await.get(&session_id).cloned())
    }

    async fn update(&self, session: WidgetSession) -> Result<WidgetSession> {
        self.sessions
            .write()
            .await
            .insert(session.id, session.clone());
        Ok(session)
    }
}
