// Common API types
//
// ApiError is the single error surface for handlers: every failure maps to
// a status code plus a JSON body of the shape {"error": "..."}.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use emberchat_core::DeliveryError;

/// Handler-level error with a JSON body
#[derive(Debug)]
pub enum ApiError {
    NotFound(&'static str),
    Unauthorized,
    Forbidden,
    Conflict(String),
    Unavailable,
    Internal,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::NotFound(what) => format!("{what} not found"),
            ApiError::Unauthorized => "Unauthorized".to_string(),
            ApiError::Forbidden => "Forbidden".to_string(),
            ApiError::Conflict(msg) => msg.clone(),
            ApiError::Unavailable => "Temporarily unavailable".to_string(),
            ApiError::Internal => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.message() }))).into_response()
    }
}

impl From<DeliveryError> for ApiError {
    fn from(err: DeliveryError) -> Self {
        match err {
            DeliveryError::WidgetNotFound(_) => ApiError::NotFound("Widget"),
            DeliveryError::SessionNotFound(_) => ApiError::NotFound("Session"),
            DeliveryError::Unauthorized => ApiError::Unauthorized,
            DeliveryError::Forbidden => ApiError::Forbidden,
            DeliveryError::InvalidTransition { .. } => ApiError::Conflict(err.to_string()),
            DeliveryError::StoreUnavailable(msg) => {
                tracing::error!("store unavailable: {}", msg);
                ApiError::Unavailable
            }
            DeliveryError::Internal(err) => {
                tracing::error!("internal error: {:#}", err);
                ApiError::Internal
            }
        }
    }
}
