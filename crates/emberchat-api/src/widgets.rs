// Widget registration HTTP routes
//
// Registration mints the widget plus its owner key. The key is shown once
// in this response and stored hashed; losing it means re-registering.
// Account management around owners is the platform's concern, not this
// service's.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use emberchat_core::{DeliveryError, Widget, WidgetDirectory};

use crate::auth::{generate_owner_key, require_owner, OwnerKeyRegistry};
use crate::common::ApiError;

/// Request to register a widget
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateWidgetRequest {
    /// Display name for the widget
    #[schema(example = "Docs assistant")]
    pub name: String,
}

/// Response to widget registration; `owner_key` is shown only here
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateWidgetResponse {
    pub widget: Widget,
    /// Bearer key for the owner-facing endpoints. Not retrievable later.
    pub owner_key: String,
}

/// App state for widget routes
#[derive(Clone)]
pub struct AppState {
    pub widgets: Arc<dyn WidgetDirectory>,
    pub auth: OwnerKeyRegistry,
}

/// Create widget routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/widgets", post(create_widget))
        .route("/widgets/:widget_id", get(get_widget))
        .with_state(state)
}

/// POST /widgets - Register a widget and mint its owner key
#[utoipa::path(
    post,
    path = "/widgets",
    request_body = CreateWidgetRequest,
    responses(
        (status = 201, description = "Widget registered", body = CreateWidgetResponse)
    ),
    tag = "widgets"
)]
pub async fn create_widget(
    State(state): State<AppState>,
    Json(req): Json<CreateWidgetRequest>,
) -> Result<(StatusCode, Json<CreateWidgetResponse>), ApiError> {
    let owner_id = Uuid::now_v7();
    let widget = state.widgets.create(Widget::new(owner_id, req.name)).await?;

    let key = generate_owner_key();
    state.auth.register(key.key_hash, owner_id).await;

    tracing::info!(widget_id = %widget.id, key_prefix = %key.key_prefix, "widget registered");

    Ok((
        StatusCode::CREATED,
        Json(CreateWidgetResponse {
            widget,
            owner_key: key.key,
        }),
    ))
}

/// GET /widgets/{widget_id} - Widget details (owner only)
#[utoipa::path(
    get,
    path = "/widgets/{widget_id}",
    params(("widget_id" = Uuid, Path, description = "Widget ID")),
    responses(
        (status = 200, description = "Widget found", body = Widget),
        (status = 401, description = "Missing or unknown owner key"),
        (status = 403, description = "Caller does not own this widget"),
        (status = 404, description = "Widget not found")
    ),
    security(("owner_key" = [])),
    tag = "widgets"
)]
pub async fn get_widget(
    State(state): State<AppState>,
    Path(widget_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<Widget>, ApiError> {
    let widget = state
        .widgets
        .get(widget_id)
        .await?
        .ok_or(DeliveryError::WidgetNotFound(widget_id))?;
    require_owner(&state.auth, &headers, &widget).await?;
    Ok(Json(widget))
}
