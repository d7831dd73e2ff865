//! Shared application state for the HTTP layer

use std::sync::Arc;
use std::time::Duration;

use crate::config::RelayConfig;
use crate::event_store::EventStore;
use crate::relay::{SnapshotAssembler, SubscriptionManager};

/// State shared by every request handler
pub struct AppState {
    /// The shared event store
    pub store: Arc<EventStore>,

    /// Grace-period snapshot reads
    pub snapshots: SnapshotAssembler,

    /// Live stream subscriptions
    pub subscriptions: SubscriptionManager,

    /// Reconnect delay advertised to stream clients
    pub retry: Duration,
}

impl AppState {
    /// Build the relay state around an existing store
    pub fn new(store: Arc<EventStore>, config: &RelayConfig) -> Self {
        Self {
            snapshots: SnapshotAssembler::with_grace_period(store.clone(), config.snapshot_grace),
            subscriptions: SubscriptionManager::with_heartbeat_interval(
                store.clone(),
                config.heartbeat_interval,
            ),
            retry: config.retry,
            store,
        }
    }

    /// Memory-only state, mostly for tests
    pub fn in_memory(config: &RelayConfig) -> Self {
        Self::new(Arc::new(EventStore::new()), config)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        self.subscriptions.heartbeat_interval()
    }
}
