//! Event store error taxonomy

use crate::types::SpaceId;

/// Result type for EventStore operations
pub type EventStoreResult<T> = Result<T, EventStoreError>;

/// Errors that can occur in EventStore operations
#[derive(Debug, thiserror::Error)]
pub enum EventStoreError {
    /// The referenced space was never created
    #[error("space not found: {0}")]
    NotFound(SpaceId),

    /// The submitted event payload is malformed
    #[error("invalid event: {0}")]
    InvalidInput(String),

    /// The durable journal could not be written or read
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EventStoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, EventStoreError::NotFound(_))
    }
}
