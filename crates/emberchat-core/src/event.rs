// Widget event entity types
//
// WidgetEvent is a per-session stream record; Notification is the owner-facing
// variant keyed by widget alone, with its own id sequence. Both are ephemeral:
// they live in a TTL cache and are never written to durable storage.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Event types produced by the platform itself. Producers may append any
/// other type string; these are the ones the delivery subsystem emits.
pub mod event_types {
    /// Session mode changed (takeover or handback)
    pub const MODE_CHANGED: &str = "mode_changed";
    /// Visitor asked for a human operator
    pub const HUMAN_REQUESTED: &str = "human_requested";
    /// A human operator sent a message
    pub const OPERATOR_MESSAGE: &str = "operator_message";
}

/// WidgetEvent - one record in a per-(widget, session) event stream
///
/// `id` is strictly increasing within its stream, starting at 1. Generation
/// order is the only ordering guarantee; no wall-clock ordering is promised.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct WidgetEvent {
    pub id: u64,
    pub event_type: String,
    pub data: Value,
}

impl WidgetEvent {
    /// Wire payload: the event's own data keys spliced alongside `type` at
    /// the top level, not nested under a `data` key.
    pub fn wire_payload(&self) -> Value {
        merge_type(&self.event_type, &self.data)
    }
}

/// Notification - owner-facing alert keyed by widget only
///
/// Same shape as WidgetEvent but numbered independently from any session's
/// event stream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct Notification {
    pub id: u64,
    pub event_type: String,
    pub data: Value,
}

impl Notification {
    pub fn wire_payload(&self) -> Value {
        merge_type(&self.event_type, &self.data)
    }
}

/// TypingSignal - the latest "operator is typing" mark for a session
///
/// Overwritten on every new signal; only the latest value matters. The store
/// bounds it with a short TTL so a stalled typist clears itself.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct TypingSignal {
    /// Epoch seconds when the signal was recorded
    pub timestamp: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator_id: Option<Uuid>,
}

fn merge_type(event_type: &str, data: &Value) -> Value {
    let mut payload = match data {
        Value::Object(map) => Value::Object(map.clone()),
        Value::Null => json!({}),
        other => json!({ "data": other }),
    };
    payload["type"] = json!(event_type);
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_payload_splices_type() {
        let event = WidgetEvent {
            id: 7,
            event_type: "operator_message".to_string(),
            data: json!({"content": "hello", "operator_id": "op-1"}),
        };

        let payload = event.wire_payload();
        assert_eq!(payload["type"], "operator_message");
        assert_eq!(payload["content"], "hello");
        assert_eq!(payload["operator_id"], "op-1");
        // Keys live at the top level, not under a nested object
        assert!(payload.get("data").is_none());
    }

    #[test]
    fn test_wire_payload_null_data() {
        let event = WidgetEvent {
            id: 1,
            event_type: "human_requested".to_string(),
            data: Value::Null,
        };

        assert_eq!(event.wire_payload(), json!({"type": "human_requested"}));
    }

    #[test]
    fn test_wire_payload_non_object_data() {
        let event = WidgetEvent {
            id: 1,
            event_type: "raw".to_string(),
            data: json!("scalar"),
        };

        let payload = event.wire_payload();
        assert_eq!(payload["type"], "raw");
        assert_eq!(payload["data"], "scalar");
    }
}
