// Widget session domain types
//
// A session is one visitor's conversation with a widget. Sessions carry a
// mode: served by the AI pipeline, waiting for a human, or taken over by a
// human operator. The delivery loop and poll endpoints only read sessions;
// the mode transitions here are driven by the takeover/handback operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::error::{DeliveryError, Result};

/// Who is serving a session
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    /// Served by the AI pipeline (default)
    Ai,
    /// Visitor asked for a human; owner has been notified
    Waiting,
    /// A human operator has taken the session over
    Human,
}

impl std::fmt::Display for SessionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionMode::Ai => write!(f, "ai"),
            SessionMode::Waiting => write!(f, "waiting"),
            SessionMode::Human => write!(f, "human"),
        }
    }
}

impl From<&str> for SessionMode {
    fn from(s: &str) -> Self {
        match s {
            "waiting" => SessionMode::Waiting,
            "human" => SessionMode::Human,
            _ => SessionMode::Ai,
        }
    }
}

/// WidgetSession - one visitor conversation with a widget
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct WidgetSession {
    pub id: Uuid,
    pub widget_id: Uuid,
    pub mode: SessionMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub human_operator_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_human_activity: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl WidgetSession {
    /// Create a fresh AI-served session for a widget
    pub fn new(widget_id: Uuid) -> Self {
        Self {
            id: Uuid::now_v7(),
            widget_id,
            mode: SessionMode::Ai,
            human_operator_id: None,
            last_human_activity: None,
            created_at: Utc::now(),
        }
    }

    /// Visitor asked for a human. Ai -> Waiting; already Waiting or Human
    /// is a no-op (the request is already visible to the owner).
    pub fn request_human(&mut self) -> bool {
        match self.mode {
            SessionMode::Ai => {
                self.mode = SessionMode::Waiting;
                true
            }
            SessionMode::Waiting | SessionMode::Human => false,
        }
    }

    /// Operator takes the session over. Ai|Waiting -> Human.
    pub fn take_over(&mut self, operator_id: Uuid) -> Result<()> {
        match self.mode {
            SessionMode::Ai | SessionMode::Waiting => {
                self.mode = SessionMode::Human;
                self.human_operator_id = Some(operator_id);
                self.last_human_activity = Some(Utc::now());
                Ok(())
            }
            SessionMode::Human => {
                Err(DeliveryError::transition(self.mode, SessionMode::Human))
            }
        }
    }

    /// Operator hands the session back to the AI. Human -> Ai.
    pub fn hand_back(&mut self) -> Result<()> {
        match self.mode {
            SessionMode::Human => {
                self.mode = SessionMode::Ai;
                self.human_operator_id = None;
                Ok(())
            }
            _ => Err(DeliveryError::transition(self.mode, SessionMode::Ai)),
        }
    }

    /// Record operator activity (messages, takeover)
    pub fn touch_human_activity(&mut self) {
        self.last_human_activity = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_human_from_ai() {
        let mut session = WidgetSession::new(Uuid::now_v7());
        assert!(session.request_human());
        assert_eq!(session.mode, SessionMode::Waiting);

        // Second request is a no-op
        assert!(!session.request_human());
        assert_eq!(session.mode, SessionMode::Waiting);
    }

    #[test]
    fn test_take_over_from_ai_and_waiting() {
        let operator = Uuid::now_v7();

        let mut session = WidgetSession::new(Uuid::now_v7());
        session.take_over(operator).unwrap();
        assert_eq!(session.mode, SessionMode::Human);
        assert_eq!(session.human_operator_id, Some(operator));
        assert!(session.last_human_activity.is_some());

        let mut session = WidgetSession::new(Uuid::now_v7());
        session.request_human();
        session.take_over(operator).unwrap();
        assert_eq!(session.mode, SessionMode::Human);
    }

    #[test]
    fn test_take_over_twice_rejected() {
        let mut session = WidgetSession::new(Uuid::now_v7());
        session.take_over(Uuid::now_v7()).unwrap();

        let err = session.take_over(Uuid::now_v7()).unwrap_err();
        assert!(matches!(err, DeliveryError::InvalidTransition { .. }));
    }

    #[test]
    fn test_hand_back() {
        let mut session = WidgetSession::new(Uuid::now_v7());
        session.take_over(Uuid::now_v7()).unwrap();
        session.hand_back().unwrap();
        assert_eq!(session.mode, SessionMode::Ai);
        assert_eq!(session.human_operator_id, None);
    }

    #[test]
    fn test_hand_back_requires_human_mode() {
        let mut session = WidgetSession::new(Uuid::now_v7());
        assert!(session.hand_back().is_err());

        session.request_human();
        assert!(session.hand_back().is_err());
    }

    #[test]
    fn test_mode_serialization() {
        assert_eq!(serde_json::to_string(&SessionMode::Ai).unwrap(), "\"ai\"");
        assert_eq!(
            serde_json::to_string(&SessionMode::Waiting).unwrap(),
            "\"waiting\""
        );
        assert_eq!(SessionMode::from("human"), SessionMode::Human);
        assert_eq!(SessionMode::from("bogus"), SessionMode::Ai);
    }
}
