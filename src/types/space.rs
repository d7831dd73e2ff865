//! Space metadata

use serde::{Deserialize, Serialize};

/// Opaque, server-generated space identifier
pub type SpaceId = String;

/// Registry record for a space
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceMeta {
    pub id: SpaceId,
    /// Milliseconds since epoch
    pub created_at: i64,
}

impl SpaceMeta {
    pub fn new(id: impl Into<SpaceId>, created_at: i64) -> Self {
        Self {
            id: id.into(),
            created_at,
        }
    }
}

/// Generate a fresh, collision-resistant space id
pub fn generate_space_id() -> SpaceId {
    format!("space_{}", uuid::Uuid::new_v4().simple())
}
