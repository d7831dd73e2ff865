//! Point-in-time snapshot reads
//!
//! The store underneath may be populated asynchronously, so a snapshot waits
//! a grace period before reading to let in-flight appends settle. This is
//! best effort: events arriving during or after the read can still be
//! missing from the result.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::event_store::{EventStore, EventStoreError, EventStoreResult};
use crate::types::Event;

/// Default grace period before a snapshot read
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_millis(200);

/// Collects every currently known event of a space
#[derive(Clone)]
pub struct SnapshotAssembler {
    store: Arc<EventStore>,
    grace_period: Duration,
}

impl SnapshotAssembler {
    pub fn new(store: Arc<EventStore>) -> Self {
        Self::with_grace_period(store, DEFAULT_GRACE_PERIOD)
    }

    pub fn with_grace_period(store: Arc<EventStore>, grace_period: Duration) -> Self {
        Self {
            store,
            grace_period,
        }
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Read all events of a space after the grace period
    ///
    /// Unknown spaces fail immediately with `NotFound`, without waiting.
    /// A known space with no events yields an empty vector.
    pub async fn snapshot(&self, space_id: &str) -> EventStoreResult<Vec<Event>> {
        if !self.store.space_exists(space_id) {
            return Err(EventStoreError::NotFound(space_id.to_string()));
        }

        if !self.grace_period.is_zero() {
            tokio::time::sleep(self.grace_period).await;
        }

        let events = self.store.read_all(space_id)?;
        debug!(space_id, events = events.len(), "snapshot assembled");
        Ok(events)
    }
}
