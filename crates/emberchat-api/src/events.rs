// Event delivery HTTP routes (SSE stream + poll fallback)
//
// Events are notifications streamed to widget clients, not primary data
// storage: they live in a TTL cache and clients resume via lastEventId.
//
// Durable-cursor design:
// - id-based resumption: clients resume from any lastEventId
// - lastEventId in the poll response: clients know where to continue
// - the SSE reconnect frame carries the cursor for seamless re-open

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderName},
    response::{
        sse::{Event as SseEvent, Sse},
        IntoResponse,
    },
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use utoipa::{IntoParams, ToSchema};

use std::{convert::Infallible, sync::Arc};
use uuid::Uuid;

use emberchat_core::{EventStore, TypingStore, WidgetEvent};
use emberchat_delivery::{ChannelSink, DeliveryConfig, DeliveryFrame, DeliveryLoop};

use crate::common::ApiError;
use crate::services::SessionModeService;

// ============================================
// App State and Routes
// ============================================

/// App state for event delivery routes
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SessionModeService>,
    pub events: Arc<dyn EventStore>,
    pub typing: Arc<dyn TypingStore>,
    pub delivery_config: DeliveryConfig,
}

/// Create event delivery routes (nested under widget sessions)
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/widgets/:widget_id/sessions/:session_id/events",
            get(stream_events),
        )
        .route(
            "/widgets/:widget_id/sessions/:session_id/poll",
            get(poll_events),
        )
        .with_state(state)
}

// ============================================
// Query Parameters
// ============================================

/// Cursor query for both the SSE stream and the poll fallback
#[derive(Debug, Deserialize, IntoParams)]
pub struct CursorQuery {
    /// Resume after this event id. Events with id > lastEventId are
    /// returned. Use 0 or omit to start from the beginning of the window.
    #[serde(default, rename = "lastEventId")]
    #[param(example = 0)]
    pub last_event_id: u64,
}

// ============================================
// HTTP Handlers
// ============================================

/// GET /widgets/{widget_id}/sessions/{session_id}/events - SSE event stream
///
/// Holds the connection open and pushes events as they appear. The server
/// caps connection lifetime; the terminal `reconnect` frame carries the
/// cursor to resume from on the next connection.
#[utoipa::path(
    get,
    path = "/widgets/{widget_id}/sessions/{session_id}/events",
    params(
        ("widget_id" = Uuid, Path, description = "Widget ID"),
        ("session_id" = Uuid, Path, description = "Session ID"),
        CursorQuery
    ),
    responses(
        (status = 200, description = "Event stream", content_type = "text/event-stream"),
        (status = 404, description = "Widget or session not found")
    ),
    tag = "events"
)]
pub async fn stream_events(
    State(state): State<AppState>,
    Path((widget_id, session_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<CursorQuery>,
) -> Result<impl IntoResponse, ApiError> {
    // Validate before any streaming begins; no state is created on 404
    state.service.resolve(widget_id, session_id).await?;

    let last_event_id = query.last_event_id;
    tracing::info!(%widget_id, %session_id, last_event_id, "starting event stream");

    let delivery = DeliveryLoop::new(
        state.events.clone(),
        state.typing.clone(),
        state.delivery_config.clone(),
    );
    let (tx, rx) = tokio::sync::mpsc::channel::<DeliveryFrame>(64);

    tokio::spawn(async move {
        let mut sink = ChannelSink::new(tx);
        match delivery
            .run(widget_id, session_id, last_event_id, &mut sink)
            .await
        {
            Ok(outcome) => tracing::debug!(
                %session_id,
                last_event_id = outcome.last_event_id,
                reason = ?outcome.reason,
                "event stream ended"
            ),
            Err(e) => tracing::error!(%session_id, "event stream failed: {}", e),
        }
    });

    let stream =
        ReceiverStream::new(rx).map(|frame| Ok::<_, Infallible>(frame_to_sse(&frame)));

    // The loop emits its own heartbeat comments; no transport keep-alive on top
    Ok((
        [
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
            (HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        Sse::new(stream),
    ))
}

/// Map a delivery frame onto the SSE wire format
fn frame_to_sse(frame: &DeliveryFrame) -> SseEvent {
    if matches!(frame, DeliveryFrame::Heartbeat) {
        return SseEvent::default().comment("heartbeat");
    }

    let mut sse = SseEvent::default();
    if let Some(id) = frame.id() {
        sse = sse.id(id.to_string());
    }
    if let Some(name) = frame.event_name() {
        sse = sse.event(name);
    }
    if let Some(data) = frame.data() {
        sse = sse.data(data.to_string());
    }
    sse
}

// ============================================
// Poll fallback (JSON response)
// ============================================

/// Response for the poll fallback: an immediate snapshot, never a blocking
/// wait. Clients that cannot hold an SSE connection call this on a timer.
#[derive(Debug, Serialize, ToSchema)]
pub struct PollResponse {
    pub success: bool,
    /// Events with id > the requested cursor, ascending
    pub events: Vec<Value>,
    /// New cursor: max(id seen, input lastEventId)
    #[serde(rename = "lastEventId")]
    pub last_event_id: u64,
}

/// Serialize one event for the JSON poll body: wire payload plus its id
pub(crate) fn event_body(event: &WidgetEvent) -> Value {
    let mut body = event.wire_payload();
    body["id"] = json!(event.id);
    body
}

/// GET /widgets/{widget_id}/sessions/{session_id}/poll - Snapshot read
#[utoipa::path(
    get,
    path = "/widgets/{widget_id}/sessions/{session_id}/poll",
    params(
        ("widget_id" = Uuid, Path, description = "Widget ID"),
        ("session_id" = Uuid, Path, description = "Session ID"),
        CursorQuery
    ),
    responses(
        (status = 200, description = "Events since the cursor", body = PollResponse),
        (status = 404, description = "Widget or session not found")
    ),
    tag = "events"
)]
pub async fn poll_events(
    State(state): State<AppState>,
    Path((widget_id, session_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<CursorQuery>,
) -> Result<Json<PollResponse>, ApiError> {
    state.service.resolve(widget_id, session_id).await?;

    let events = state
        .events
        .events_since(widget_id, session_id, query.last_event_id)
        .await?;

    let last_event_id = events
        .last()
        .map(|event| event.id)
        .unwrap_or(query.last_event_id);

    Ok(Json(PollResponse {
        success: true,
        events: events.iter().map(event_body).collect(),
        last_event_id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use std::time::Duration;
    use tower::ServiceExt;

    use emberchat_core::{
        InMemorySessionDirectory, InMemoryWidgetDirectory, Widget, WidgetSession,
    };
    use emberchat_store::{StoreConfig, Stores};

    struct TestApp {
        router: Router,
        stores: Stores,
        widget_id: Uuid,
        session_id: Uuid,
    }

    async fn test_app(delivery_config: DeliveryConfig) -> TestApp {
        let widgets = InMemoryWidgetDirectory::new();
        let sessions = InMemorySessionDirectory::new();
        let stores = Stores::new(&StoreConfig::default());

        let widget = Widget::new(Uuid::now_v7(), "Support");
        let session = WidgetSession::new(widget.id);
        let (widget_id, session_id) = (widget.id, session.id);
        widgets.seed(widget).await;
        sessions.seed(session).await;

        let service = Arc::new(SessionModeService::new(
            Arc::new(widgets),
            Arc::new(sessions),
            stores.events.clone(),
            stores.notifications.clone(),
            stores.typing.clone(),
        ));

        let state = AppState {
            service,
            events: stores.events.clone(),
            typing: stores.typing.clone(),
            delivery_config,
        };

        TestApp {
            router: routes(state),
            stores,
            widget_id,
            session_id,
        }
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_poll_end_to_end() {
        let app = test_app(DeliveryConfig::default()).await;
        for n in 1..=3 {
            app.stores
                .events
                .append(app.widget_id, app.session_id, "message", json!({ "n": n }))
                .await
                .unwrap();
        }

        let uri = format!(
            "/widgets/{}/sessions/{}/poll?lastEventId=0",
            app.widget_id, app.session_id
        );
        let (status, body) = get_json(app.router.clone(), &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["lastEventId"], 3);
        let events = body["events"].as_array().unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0]["id"], 1);
        assert_eq!(events[0]["type"], "message");
        assert_eq!(events[0]["n"], 1);

        // Caught up: empty result, cursor unchanged
        let uri = format!(
            "/widgets/{}/sessions/{}/poll?lastEventId=3",
            app.widget_id, app.session_id
        );
        let (status, body) = get_json(app.router, &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["events"].as_array().unwrap().is_empty());
        assert_eq!(body["lastEventId"], 3);
    }

    #[tokio::test]
    async fn test_poll_defaults_cursor_to_zero() {
        let app = test_app(DeliveryConfig::default()).await;
        app.stores
            .events
            .append(app.widget_id, app.session_id, "message", json!({}))
            .await
            .unwrap();

        let uri = format!(
            "/widgets/{}/sessions/{}/poll",
            app.widget_id, app.session_id
        );
        let (status, body) = get_json(app.router, &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["events"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_widget_is_404_with_no_writes() {
        let app = test_app(DeliveryConfig::default()).await;
        let bogus_widget = Uuid::now_v7();
        let bogus_session = Uuid::now_v7();

        let uri = format!("/widgets/{bogus_widget}/sessions/{bogus_session}/poll");
        let (status, body) = get_json(app.router.clone(), &uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Widget not found");

        let uri = format!("/widgets/{bogus_widget}/sessions/{bogus_session}/events");
        let (status, body) = get_json(app.router, &uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Widget not found");

        // Nothing was created for the unknown stream
        let events = app
            .stores
            .events
            .events_since(bogus_widget, bogus_session, 0)
            .await
            .unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_session_is_404() {
        let app = test_app(DeliveryConfig::default()).await;
        let uri = format!(
            "/widgets/{}/sessions/{}/poll",
            app.widget_id,
            Uuid::now_v7()
        );
        let (status, body) = get_json(app.router, &uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Session not found");
    }

    #[tokio::test]
    async fn test_sse_stream_headers_and_frames() {
        // Zero max duration: connected + reconnect, then the stream closes,
        // so the whole body can be collected
        let app = test_app(
            DeliveryConfig::default().with_max_connection(Duration::ZERO),
        )
        .await;
        app.stores
            .events
            .append(app.widget_id, app.session_id, "message", json!({}))
            .await
            .unwrap();

        let uri = format!(
            "/widgets/{}/sessions/{}/events?lastEventId=7",
            app.widget_id, app.session_id
        );
        let response = app
            .router
            .oneshot(Request::builder().uri(&uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"],
            "text/event-stream"
        );
        assert_eq!(response.headers()["cache-control"], "no-cache");
        assert_eq!(response.headers()["x-accel-buffering"], "no");

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("event: connected"));
        assert!(text.contains("event: reconnect"));
        assert!(text.contains("\"lastEventId\":7"));
    }

    #[test]
    fn test_event_body_includes_id_and_spliced_payload() {
        let event = WidgetEvent {
            id: 4,
            event_type: "operator_message".to_string(),
            data: json!({ "content": "hi" }),
        };
        let body = event_body(&event);
        assert_eq!(body["id"], 4);
        assert_eq!(body["type"], "operator_message");
        assert_eq!(body["content"], "hi");
    }
}
