// Widget entity type
//
// A widget is one embeddable chat instance owned by a platform user.
// Persistence of widgets is out of scope here; the directory traits in
// traits.rs are the seam a database-backed implementation plugs into.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Widget - embeddable chat instance owned by a platform user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct Widget {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Widget {
    pub fn new(owner_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            owner_id,
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}
