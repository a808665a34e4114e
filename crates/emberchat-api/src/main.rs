// Emberchat API server
// Decision: in-memory directories by default; a database-backed pair plugs
// into the same traits when the platform's account service is wired in
// Event delivery model: per-session event streams served over SSE with a
// poll fallback, plus owner-facing notifications

mod auth;
mod common;
mod events;
mod notifications;
mod services;
mod sessions;
mod widgets;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use axum::{routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use emberchat_core::{
    InMemorySessionDirectory, InMemoryWidgetDirectory, Notification, SessionMode, TypingSignal,
    Widget, WidgetEvent, WidgetSession,
};
use emberchat_delivery::DeliveryConfig;
use emberchat_store::{StoreConfig, Stores};

use auth::OwnerKeyRegistry;
use services::SessionModeService;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Registers the bearer scheme the owner-facing endpoints reference
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "owner_key",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        widgets::create_widget,
        widgets::get_widget,
        sessions::create_session,
        sessions::get_session,
        sessions::request_human,
        sessions::take_over,
        sessions::hand_back,
        sessions::create_message,
        sessions::set_typing,
        events::stream_events,
        events::poll_events,
        notifications::poll_notifications,
    ),
    components(
        schemas(
            Widget, WidgetSession, SessionMode,
            WidgetEvent, Notification, TypingSignal,
            widgets::CreateWidgetRequest,
            widgets::CreateWidgetResponse,
            sessions::CreateOperatorMessageRequest,
            events::PollResponse,
            notifications::NotificationsResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "widgets", description = "Widget registration endpoints"),
        (name = "sessions", description = "Session lifecycle and takeover endpoints"),
        (name = "events", description = "Event delivery endpoints (SSE + poll)"),
        (name = "notifications", description = "Owner notification endpoints")
    ),
    info(
        title = "Emberchat API",
        version = "0.3.0",
        description = "Event delivery API for embeddable chat widgets: SSE streams, polling, and human takeover",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "emberchat_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("emberchat-api starting...");

    // Store and delivery configuration from environment
    let store_config = StoreConfig::from_env();
    let delivery_config = DeliveryConfig::from_env();
    tracing::info!(
        event_ttl_secs = store_config.event_ttl.as_secs(),
        typing_ttl_secs = store_config.typing_ttl.as_secs(),
        check_interval_ms = delivery_config.check_interval.as_millis() as u64,
        heartbeat_secs = delivery_config.heartbeat_interval.as_secs(),
        max_connection_secs = delivery_config.max_connection.as_secs(),
        "Delivery configured"
    );

    // The three shared stores, created once at startup
    let stores = Stores::new(&store_config);

    // Identity directories; in-memory until the account service is wired in
    let widgets = Arc::new(InMemoryWidgetDirectory::new());
    let sessions = Arc::new(InMemorySessionDirectory::new());
    tracing::info!("Using in-memory widget/session directories");

    // Owner key registry for operator endpoints
    let auth_registry = OwnerKeyRegistry::new();

    let service = Arc::new(SessionModeService::new(
        widgets.clone(),
        sessions.clone(),
        stores.events.clone(),
        stores.notifications.clone(),
        stores.typing.clone(),
    ));

    // Create module-specific states
    let widgets_state = widgets::AppState {
        widgets: widgets.clone(),
        auth: auth_registry.clone(),
    };
    let sessions_state = sessions::AppState {
        service: service.clone(),
        auth: auth_registry.clone(),
    };
    let events_state = events::AppState {
        service: service.clone(),
        events: stores.events.clone(),
        typing: stores.typing.clone(),
        delivery_config,
    };
    let notifications_state = notifications::AppState {
        service: service.clone(),
        notifications: stores.notifications.clone(),
        auth: auth_registry.clone(),
    };

    // Janitor: sweep expired cache windows so idle streams do not pile up
    let janitor_stores = stores.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        interval.tick().await;
        loop {
            interval.tick().await;
            let purged = janitor_stores.purge_expired().await;
            if purged > 0 {
                tracing::debug!(purged, "purged expired cache windows");
            }
        }
    });

    // Load API prefix from environment (default: empty)
    // Example: API_PREFIX="/api" results in routes like /api/widgets
    let api_prefix = std::env::var("API_PREFIX").unwrap_or_default();
    if !api_prefix.is_empty() {
        tracing::info!(prefix = %api_prefix, "API prefix configured");
    }

    // Load CORS allowed origins from environment (optional)
    // Widgets embed cross-origin, so deployments set this to the sites the
    // embed script is served from
    let cors_origins: Vec<HeaderValue> = std::env::var("CORS_ALLOWED_ORIGINS")
        .ok()
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect()
        })
        .unwrap_or_default();

    if cors_origins.is_empty() {
        tracing::info!("CORS not configured (same-origin requests only)");
    } else {
        tracing::info!(origins = ?cors_origins, "CORS origins configured");
    }

    // Build API routes
    let api_routes = Router::new()
        .merge(widgets::routes(widgets_state))
        .merge(sessions::routes(sessions_state))
        .merge(events::routes(events_state))
        .merge(notifications::routes(notifications_state));

    // Build main router with health (not prefixed) and prefixed API routes
    let mut app = Router::new().route("/health", get(health));
    app = app.merge(build_router_with_prefix(api_routes, &api_prefix));

    // Add Swagger UI
    let app =
        app.merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()));

    // Add CORS layer only if origins are configured
    let app = if !cors_origins.is_empty() {
        app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(cors_origins))
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([
                    header::CONTENT_TYPE,
                    header::AUTHORIZATION,
                    header::ACCEPT,
                    header::CACHE_CONTROL,
                ])
                .allow_credentials(true),
        )
    } else {
        app
    };

    // Add tracing
    let app = app.layer(TraceLayer::new_for_http());

    // Start server
    let addr = "0.0.0.0:9000";
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Build router with optional API prefix (extracted for testing)
fn build_router_with_prefix<S: Clone + Send + Sync + 'static>(
    api_routes: Router<S>,
    api_prefix: &str,
) -> Router<S> {
    if api_prefix.is_empty() {
        api_routes
    } else {
        Router::new().nest(api_prefix, api_routes)
    }
}
