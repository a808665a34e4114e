// Delivery frames
//
// The loop produces frames; the transport adapter turns them into SSE wire
// frames. Only Event frames carry an id tag: the id is the client's resume
// cursor. Typing and lifecycle frames are untagged side channels.

use serde_json::{json, Value};
use uuid::Uuid;

use emberchat_core::WidgetEvent;

/// One unit of output from the delivery loop
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryFrame {
    /// Emitted once, immediately after the connection opens
    Connected,
    /// A stream event, tagged with its id
    Event(WidgetEvent),
    /// Operator typing indicator (at most once per observed timestamp)
    Typing {
        timestamp: u64,
        operator_id: Option<Uuid>,
    },
    /// Keep-alive comment frame
    Heartbeat,
    /// Terminal frame on max-duration cutoff; the client should re-open
    /// immediately and resume from `last_event_id`
    Reconnect { last_event_id: u64 },
}

impl DeliveryFrame {
    /// SSE event name, None for comment frames
    pub fn event_name(&self) -> Option<&str> {
        match self {
            DeliveryFrame::Connected => Some("connected"),
            DeliveryFrame::Event(event) => Some(event.event_type.as_str()),
            DeliveryFrame::Typing { .. } => Some("typing"),
            DeliveryFrame::Heartbeat => None,
            DeliveryFrame::Reconnect { .. } => Some("reconnect"),
        }
    }

    /// JSON body for the SSE data field, None for comment frames
    pub fn data(&self) -> Option<Value> {
        match self {
            DeliveryFrame::Connected => Some(json!({ "type": "connected" })),
            DeliveryFrame::Event(event) => Some(event.wire_payload()),
            DeliveryFrame::Typing {
                timestamp,
                operator_id,
            } => Some(json!({
                "type": "typing",
                "timestamp": timestamp,
                "operator_id": operator_id,
            })),
            DeliveryFrame::Heartbeat => None,
            DeliveryFrame::Reconnect { last_event_id } => {
                Some(json!({ "lastEventId": last_event_id }))
            }
        }
    }

    /// Id tag for the SSE id field; only stream events carry one
    pub fn id(&self) -> Option<u64> {
        match self {
            DeliveryFrame::Event(event) => Some(event.id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_frame_mapping() {
        let frame = DeliveryFrame::Event(WidgetEvent {
            id: 9,
            event_type: "operator_message".to_string(),
            data: json!({ "content": "hi" }),
        });

        assert_eq!(frame.event_name(), Some("operator_message"));
        assert_eq!(frame.id(), Some(9));
        let data = frame.data().unwrap();
        assert_eq!(data["type"], "operator_message");
        assert_eq!(data["content"], "hi");
    }

    #[test]
    fn test_heartbeat_is_a_comment() {
        assert_eq!(DeliveryFrame::Heartbeat.event_name(), None);
        assert_eq!(DeliveryFrame::Heartbeat.data(), None);
        assert_eq!(DeliveryFrame::Heartbeat.id(), None);
    }

    #[test]
    fn test_reconnect_carries_cursor() {
        let frame = DeliveryFrame::Reconnect { last_event_id: 42 };
        assert_eq!(frame.event_name(), Some("reconnect"));
        assert_eq!(frame.data().unwrap(), json!({ "lastEventId": 42 }));
    }
}
