// Session mode service
//
// Owns the AI <-> human takeover transitions and the operator-side write
// path. Every transition is also appended to the session's event stream
// (and, for help requests, to the owner's notification log) so connected
// widgets observe it without polling the session entity.

use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use emberchat_core::{
    event_types, DeliveryError, EventStore, NotificationStore, Result, SessionDirectory,
    TypingStore, Widget, WidgetDirectory, WidgetEvent, WidgetSession,
};

pub struct SessionModeService {
    widgets: Arc<dyn WidgetDirectory>,
    sessions: Arc<dyn SessionDirectory>,
    events: Arc<dyn EventStore>,
    notifications: Arc<dyn NotificationStore>,
    typing: Arc<dyn TypingStore>,
}

impl SessionModeService {
    pub fn new(
        widgets: Arc<dyn WidgetDirectory>,
        sessions: Arc<dyn SessionDirectory>,
        events: Arc<dyn EventStore>,
        notifications: Arc<dyn NotificationStore>,
        typing: Arc<dyn TypingStore>,
    ) -> Self {
        Self {
            widgets,
            sessions,
            events,
            notifications,
            typing,
        }
    }

    /// Resolve a (widget, session) pair, rejecting unknown ids and sessions
    /// that belong to a different widget. No store entries are created.
    pub async fn resolve(
        &self,
        widget_id: Uuid,
        session_id: Uuid,
    ) -> Result<(Widget, WidgetSession)> {
        let widget = self
            .widgets
            .get(widget_id)
            .await?
            .ok_or(DeliveryError::WidgetNotFound(widget_id))?;
        let session = self
            .sessions
            .get(session_id)
            .await?
            .filter(|session| session.widget_id == widget_id)
            .ok_or(DeliveryError::SessionNotFound(session_id))?;
        Ok((widget, session))
    }

    /// Resolve just the widget
    pub async fn resolve_widget(&self, widget_id: Uuid) -> Result<Widget> {
        self.widgets
            .get(widget_id)
            .await?
            .ok_or(DeliveryError::WidgetNotFound(widget_id))
    }

    /// Open a new AI-served session for a visitor
    pub async fn open_session(&self, widget_id: Uuid) -> Result<WidgetSession> {
        self.resolve_widget(widget_id).await?;
        let session = self.sessions.create(WidgetSession::new(widget_id)).await?;
        tracing::info!(widget_id = %widget_id, session_id = %session.id, "session opened");
        Ok(session)
    }

    /// Visitor asks for a human: Ai -> Waiting, owner gets notified.
    /// Already waiting or taken over is a no-op.
    pub async fn request_human(&self, widget_id: Uuid, session_id: Uuid) -> Result<WidgetSession> {
        let (_, mut session) = self.resolve(widget_id, session_id).await?;

        if !session.request_human() {
            return Ok(session);
        }
        let session = self.sessions.update(session).await?;

        self.events
            .append(
                widget_id,
                session_id,
                event_types::HUMAN_REQUESTED,
                json!({ "mode": session.mode }),
            )
            .await?;
        self.notifications
            .append(
                widget_id,
                event_types::HUMAN_REQUESTED,
                json!({ "session_id": session_id }),
            )
            .await?;

        tracing::info!(%widget_id, %session_id, "human operator requested");
        Ok(session)
    }

    /// Operator takes the session over: Ai|Waiting -> Human
    pub async fn take_over(
        &self,
        widget_id: Uuid,
        session_id: Uuid,
        operator_id: Uuid,
    ) -> Result<WidgetSession> {
        let (_, mut session) = self.resolve(widget_id, session_id).await?;
        session.take_over(operator_id)?;
        let session = self.sessions.update(session).await?;

        self.events
            .append(
                widget_id,
                session_id,
                event_types::MODE_CHANGED,
                json!({ "mode": session.mode, "operator_id": operator_id }),
            )
            .await?;

        tracing::info!(%widget_id, %session_id, %operator_id, "session taken over");
        Ok(session)
    }

    /// Operator hands the session back to the AI: Human -> Ai
    pub async fn hand_back(&self, widget_id: Uuid, session_id: Uuid) -> Result<WidgetSession> {
        let (_, mut session) = self.resolve(widget_id, session_id).await?;
        session.hand_back()?;
        let session = self.sessions.update(session).await?;

        self.events
            .append(
                widget_id,
                session_id,
                event_types::MODE_CHANGED,
                json!({ "mode": session.mode }),
            )
            .await?;

        tracing::info!(%widget_id, %session_id, "session handed back");
        Ok(session)
    }

    /// Operator reply into the session's event stream
    pub async fn operator_message(
        &self,
        widget_id: Uuid,
        session_id: Uuid,
        operator_id: Uuid,
        content: String,
    ) -> Result<WidgetEvent> {
        let (_, mut session) = self.resolve(widget_id, session_id).await?;

        let data = json!({ "content": content, "operator_id": operator_id });
        let id = self
            .events
            .append(widget_id, session_id, event_types::OPERATOR_MESSAGE, data.clone())
            .await?;

        session.touch_human_activity();
        self.sessions.update(session).await?;

        Ok(WidgetEvent {
            id,
            event_type: event_types::OPERATOR_MESSAGE.to_string(),
            data,
        })
    }

    /// Operator typing signal (last writer wins, TTL clears it)
    pub async fn operator_typing(
        &self,
        widget_id: Uuid,
        session_id: Uuid,
        operator_id: Uuid,
    ) -> Result<()> {
        self.resolve(widget_id, session_id).await?;
        self.typing
            .set_typing(widget_id, session_id, Some(operator_id))
            .await
    }
}
