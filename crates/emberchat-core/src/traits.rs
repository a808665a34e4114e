// Core traits for pluggable backends
//
// These traits let the delivery loop and the HTTP layer run against
// different backends:
// - Cache-backed implementations for production (emberchat-store)
// - In-memory implementations for examples and testing (memory.rs)
//
// All three stores are shared, concurrently read and written by many
// producers and consumers for the same key. Implementations must guarantee
// atomic counter increment and read-after-write visibility per key; no
// cross-key coordination is required.

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::error::Result;
use crate::event::{Notification, TypingSignal, WidgetEvent};
use crate::session::WidgetSession;
use crate::widget::Widget;

// ============================================================================
// EventStore - per-(widget, session) ordered event log
// ============================================================================

/// Append-only, TTL-bounded event log per (widget, session) stream.
///
/// Ids are assigned by a per-stream monotonic counter starting at 1. The
/// counter and the entries share one TTL window: a stream idle past the
/// window disappears wholesale, and individual events age out of it
/// silently. Absence is never reported as an error.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Append an event to a stream, returning its assigned id
    async fn append(
        &self,
        widget_id: Uuid,
        session_id: Uuid,
        event_type: &str,
        data: Value,
    ) -> Result<u64>;

    /// Events with id > after_id, ascending. Finite and restartable:
    /// repeated calls with the same cursor return the same suffix.
    async fn events_since(
        &self,
        widget_id: Uuid,
        session_id: Uuid,
        after_id: u64,
    ) -> Result<Vec<WidgetEvent>>;
}

// ============================================================================
// TypingStore - latest typing signal per (widget, session)
// ============================================================================

/// Last-writer-wins typing indicator store.
#[async_trait]
pub trait TypingStore: Send + Sync {
    /// Record "operator is typing now", overwriting any previous signal
    async fn set_typing(
        &self,
        widget_id: Uuid,
        session_id: Uuid,
        operator_id: Option<Uuid>,
    ) -> Result<()>;

    /// Latest signal, or None once the TTL has passed
    async fn typing(&self, widget_id: Uuid, session_id: Uuid) -> Result<Option<TypingSignal>>;
}

// ============================================================================
// NotificationStore - owner-facing alerts per widget
// ============================================================================

/// Same contract shape as EventStore, keyed by widget alone and numbered
/// independently from any session's event stream.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn append(&self, widget_id: Uuid, event_type: &str, data: Value) -> Result<u64>;

    async fn notifications_since(
        &self,
        widget_id: Uuid,
        after_id: u64,
    ) -> Result<Vec<Notification>>;
}

// ============================================================================
// Directories - widget/session identity resolution
// ============================================================================

/// Widget lookup and registration.
///
/// Durable persistence of widgets is an external concern; this trait is the
/// seam a database-backed implementation plugs into.
#[async_trait]
pub trait WidgetDirectory: Send + Sync {
    async fn create(&self, widget: Widget) -> Result<Widget>;

    async fn get(&self, widget_id: Uuid) -> Result<Option<Widget>>;
}

/// Session lookup and mutation.
#[async_trait]
pub trait SessionDirectory: Send + Sync {
    async fn create(&self, session: WidgetSession) -> Result<WidgetSession>;

    async fn get(&self, session_id: Uuid) -> Result<Option<WidgetSession>>;

    /// Persist a mutated session (mode transitions, activity stamps)
    async fn update(&self, session: WidgetSession) -> Result<WidgetSession>;
}
