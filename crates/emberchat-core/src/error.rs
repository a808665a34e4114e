// Error types for widget event delivery

use thiserror::Error;
use uuid::Uuid;

use crate::session::SessionMode;

/// Result type alias for delivery operations
pub type Result<T> = std::result::Result<T, DeliveryError>;

/// Errors that can occur while serving widget events
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Widget does not exist
    #[error("Widget not found: {0}")]
    WidgetNotFound(Uuid),

    /// Session does not exist (within an existing widget)
    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    /// Caller presented no credentials, or unknown credentials
    #[error("Unauthorized")]
    Unauthorized,

    /// Caller is authenticated but is not the widget owner
    #[error("Forbidden")]
    Forbidden,

    /// Session mode transition is not allowed from the current mode
    #[error("Invalid session mode transition: {from} -> {to}")]
    InvalidTransition { from: SessionMode, to: SessionMode },

    /// Cache backend failure; transient, callers should retry
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl DeliveryError {
    /// Create a store unavailable error
    pub fn store(msg: impl Into<String>) -> Self {
        DeliveryError::StoreUnavailable(msg.into())
    }

    /// Create an invalid transition error
    pub fn transition(from: SessionMode, to: SessionMode) -> Self {
        DeliveryError::InvalidTransition { from, to }
    }

    /// Whether the error is transient and worth retrying
    pub fn is_transient(&self) -> bool {
        matches!(self, DeliveryError::StoreUnavailable(_))
    }
}
