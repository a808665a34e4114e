// Widget session HTTP routes
//
// Visitor side: open a session, read its state, ask for a human.
// Operator side (owner key required): take over, hand back, reply, signal
// typing. Every mode transition lands in the session's event stream so
// connected widgets observe it.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use emberchat_core::{WidgetEvent, WidgetSession};

use crate::auth::{require_owner, OwnerKeyRegistry};
use crate::common::ApiError;
use crate::services::SessionModeService;

/// Request to post an operator reply into a session
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateOperatorMessageRequest {
    /// Message text shown to the visitor
    #[schema(example = "Hi, taking over from the assistant now.")]
    pub content: String,
}

/// App state for session routes
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SessionModeService>,
    pub auth: OwnerKeyRegistry,
}

/// Create session routes (nested under widgets)
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/widgets/:widget_id/sessions", post(create_session))
        .route(
            "/widgets/:widget_id/sessions/:session_id",
            get(get_session),
        )
        .route(
            "/widgets/:widget_id/sessions/:session_id/request-human",
            post(request_human),
        )
        .route(
            "/widgets/:widget_id/sessions/:session_id/takeover",
            post(take_over),
        )
        .route(
            "/widgets/:widget_id/sessions/:session_id/handback",
            post(hand_back),
        )
        .route(
            "/widgets/:widget_id/sessions/:session_id/messages",
            post(create_message),
        )
        .route(
            "/widgets/:widget_id/sessions/:session_id/typing",
            post(set_typing),
        )
        .with_state(state)
}

/// POST /widgets/{widget_id}/sessions - Open a session (visitor bootstrap)
#[utoipa::path(
    post,
    path = "/widgets/{widget_id}/sessions",
    params(("widget_id" = Uuid, Path, description = "Widget ID")),
    responses(
        (status = 201, description = "Session opened", body = WidgetSession),
        (status = 404, description = "Widget not found")
    ),
    tag = "sessions"
)]
pub async fn create_session(
    State(state): State<AppState>,
    Path(widget_id): Path<Uuid>,
) -> Result<(StatusCode, Json<WidgetSession>), ApiError> {
    let session = state.service.open_session(widget_id).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// GET /widgets/{widget_id}/sessions/{session_id} - Session snapshot
///
/// The widget UI polls this for the current mode when it has no live
/// stream open.
#[utoipa::path(
    get,
    path = "/widgets/{widget_id}/sessions/{session_id}",
    params(
        ("widget_id" = Uuid, Path, description = "Widget ID"),
        ("session_id" = Uuid, Path, description = "Session ID")
    ),
    responses(
        (status = 200, description = "Session found", body = WidgetSession),
        (status = 404, description = "Widget or session not found")
    ),
    tag = "sessions"
)]
pub async fn get_session(
    State(state): State<AppState>,
    Path((widget_id, session_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<WidgetSession>, ApiError> {
    let (_, session) = state.service.resolve(widget_id, session_id).await?;
    Ok(Json(session))
}

/// POST /widgets/{widget_id}/sessions/{session_id}/request-human
#[utoipa::path(
    post,
    path = "/widgets/{widget_id}/sessions/{session_id}/request-human",
    params(
        ("widget_id" = Uuid, Path, description = "Widget ID"),
        ("session_id" = Uuid, Path, description = "Session ID")
    ),
    responses(
        (status = 200, description = "Human requested (or already pending)", body = WidgetSession),
        (status = 404, description = "Widget or session not found")
    ),
    tag = "sessions"
)]
pub async fn request_human(
    State(state): State<AppState>,
    Path((widget_id, session_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<WidgetSession>, ApiError> {
    let session = state.service.request_human(widget_id, session_id).await?;
    Ok(Json(session))
}

/// POST /widgets/{widget_id}/sessions/{session_id}/takeover - Operator takeover
#[utoipa::path(
    post,
    path = "/widgets/{widget_id}/sessions/{session_id}/takeover",
    params(
        ("widget_id" = Uuid, Path, description = "Widget ID"),
        ("session_id" = Uuid, Path, description = "Session ID")
    ),
    responses(
        (status = 200, description = "Session taken over", body = WidgetSession),
        (status = 401, description = "Missing or unknown owner key"),
        (status = 403, description = "Caller does not own this widget"),
        (status = 404, description = "Widget or session not found"),
        (status = 409, description = "Session already taken over")
    ),
    security(("owner_key" = [])),
    tag = "sessions"
)]
pub async fn take_over(
    State(state): State<AppState>,
    Path((widget_id, session_id)): Path<(Uuid, Uuid)>,
    headers: HeaderMap,
) -> Result<Json<WidgetSession>, ApiError> {
    let widget = state.service.resolve_widget(widget_id).await?;
    let operator_id = require_owner(&state.auth, &headers, &widget).await?;

    let session = state
        .service
        .take_over(widget_id, session_id, operator_id)
        .await?;
    Ok(Json(session))
}

/// POST /widgets/{widget_id}/sessions/{session_id}/handback - Return to AI
#[utoipa::path(
    post,
    path = "/widgets/{widget_id}/sessions/{session_id}/handback",
    params(
        ("widget_id" = Uuid, Path, description = "Widget ID"),
        ("session_id" = Uuid, Path, description = "Session ID")
    ),
    responses(
        (status = 200, description = "Session handed back to the AI", body = WidgetSession),
        (status = 401, description = "Missing or unknown owner key"),
        (status = 403, description = "Caller does not own this widget"),
        (status = 404, description = "Widget or session not found"),
        (status = 409, description = "Session is not in human mode")
    ),
    security(("owner_key" = [])),
    tag = "sessions"
)]
pub async fn hand_back(
    State(state): State<AppState>,
    Path((widget_id, session_id)): Path<(Uuid, Uuid)>,
    headers: HeaderMap,
) -> Result<Json<WidgetSession>, ApiError> {
    let widget = state.service.resolve_widget(widget_id).await?;
    require_owner(&state.auth, &headers, &widget).await?;

    let session = state.service.hand_back(widget_id, session_id).await?;
    Ok(Json(session))
}

/// POST /widgets/{widget_id}/sessions/{session_id}/messages - Operator reply
#[utoipa::path(
    post,
    path = "/widgets/{widget_id}/sessions/{session_id}/messages",
    params(
        ("widget_id" = Uuid, Path, description = "Widget ID"),
        ("session_id" = Uuid, Path, description = "Session ID")
    ),
    request_body = CreateOperatorMessageRequest,
    responses(
        (status = 201, description = "Message appended to the event stream", body = WidgetEvent),
        (status = 401, description = "Missing or unknown owner key"),
        (status = 403, description = "Caller does not own this widget"),
        (status = 404, description = "Widget or session not found")
    ),
    security(("owner_key" = [])),
    tag = "sessions"
)]
pub async fn create_message(
    State(state): State<AppState>,
    Path((widget_id, session_id)): Path<(Uuid, Uuid)>,
    headers: HeaderMap,
    Json(req): Json<CreateOperatorMessageRequest>,
) -> Result<(StatusCode, Json<WidgetEvent>), ApiError> {
    let widget = state.service.resolve_widget(widget_id).await?;
    let operator_id = require_owner(&state.auth, &headers, &widget).await?;

    let event = state
        .service
        .operator_message(widget_id, session_id, operator_id, req.content)
        .await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// POST /widgets/{widget_id}/sessions/{session_id}/typing - Typing signal
#[utoipa::path(
    post,
    path = "/widgets/{widget_id}/sessions/{session_id}/typing",
    params(
        ("widget_id" = Uuid, Path, description = "Widget ID"),
        ("session_id" = Uuid, Path, description = "Session ID")
    ),
    responses(
        (status = 204, description = "Typing signal recorded"),
        (status = 401, description = "Missing or unknown owner key"),
        (status = 403, description = "Caller does not own this widget"),
        (status = 404, description = "Widget or session not found")
    ),
    security(("owner_key" = [])),
    tag = "sessions"
)]
pub async fn set_typing(
    State(state): State<AppState>,
    Path((widget_id, session_id)): Path<(Uuid, Uuid)>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let widget = state.service.resolve_widget(widget_id).await?;
    let operator_id = require_owner(&state.auth, &headers, &widget).await?;

    state
        .service
        .operator_typing(widget_id, session_id, operator_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
