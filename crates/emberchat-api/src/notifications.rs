// Owner notification polling routes
//
// Widget owners poll their alert log (human-help requests and the like) on
// a separate numbering space from any session's event stream. Owner-only:
// the caller must present the widget's owner key.

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use emberchat_core::{Notification, NotificationStore};

use crate::auth::{require_owner, OwnerKeyRegistry};
use crate::common::ApiError;
use crate::events::CursorQuery;
use crate::services::SessionModeService;

/// App state for notification routes
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SessionModeService>,
    pub notifications: Arc<dyn NotificationStore>,
    pub auth: OwnerKeyRegistry,
}

/// Create notification routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/widgets/:widget_id/notifications", get(poll_notifications))
        .with_state(state)
}

/// Response for the owner notification poll; same shape as the session poll
#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationsResponse {
    pub success: bool,
    /// Notifications with id > the requested cursor, ascending
    pub events: Vec<Value>,
    /// New cursor: max(id seen, input lastEventId)
    #[serde(rename = "lastEventId")]
    pub last_event_id: u64,
}

fn notification_body(notification: &Notification) -> Value {
    let mut body = notification.wire_payload();
    body["id"] = json!(notification.id);
    body
}

/// GET /widgets/{widget_id}/notifications - Owner alert poll
#[utoipa::path(
    get,
    path = "/widgets/{widget_id}/notifications",
    params(
        ("widget_id" = Uuid, Path, description = "Widget ID"),
        CursorQuery
    ),
    responses(
        (status = 200, description = "Notifications since the cursor", body = NotificationsResponse),
        (status = 401, description = "Missing or unknown owner key"),
        (status = 403, description = "Caller does not own this widget"),
        (status = 404, description = "Widget not found")
    ),
    security(("owner_key" = [])),
    tag = "notifications"
)]
pub async fn poll_notifications(
    State(state): State<AppState>,
    Path(widget_id): Path<Uuid>,
    Query(query): Query<CursorQuery>,
    headers: HeaderMap,
) -> Result<Json<NotificationsResponse>, ApiError> {
    let widget = state.service.resolve_widget(widget_id).await?;
    require_owner(&state.auth, &headers, &widget).await?;

    let notifications = state
        .notifications
        .notifications_since(widget_id, query.last_event_id)
        .await?;

    let last_event_id = notifications
        .last()
        .map(|notification| notification.id)
        .unwrap_or(query.last_event_id);

    Ok(Json(NotificationsResponse {
        success: true,
        events: notifications.iter().map(notification_body).collect(),
        last_event_id,
    }))
}
