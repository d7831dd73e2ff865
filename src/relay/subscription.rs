//! Live subscriptions
//!
//! A live subscription is `OPEN → (event | heartbeat)* → CLOSED`. It opens
//! with a `hello`, then interleaves deduplicated events from the space feed
//! with heartbeats at a fixed interval. Closing is dropping: when the
//! transport goes away the stream is dropped, which stops the heartbeat
//! timer, releases the broadcast receiver and frees the seen set.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::feed::open_feed;
use crate::event_store::{EventStore, EventStoreResult};
use crate::types::{Event, SpaceId};
use crate::utils::current_timestamp_ms;

/// Default interval between heartbeats
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Shortest accepted heartbeat interval
pub const MIN_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(1);

/// Messages pushed to a live subscriber
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamMessage {
    /// Sent once on open, confirms the channel is live
    Hello {
        #[serde(rename = "spaceId")]
        space_id: SpaceId,
        now: i64,
    },

    /// Periodic keep-alive, carries no event
    Heartbeat {
        #[serde(rename = "spaceId")]
        space_id: SpaceId,
        now: i64,
    },

    /// A relayed event
    Event { event: Event },
}

impl StreamMessage {
    pub fn hello(space_id: &str) -> Self {
        StreamMessage::Hello {
            space_id: space_id.to_string(),
            now: current_timestamp_ms(),
        }
    }

    pub fn heartbeat(space_id: &str) -> Self {
        StreamMessage::Heartbeat {
            space_id: space_id.to_string(),
            now: current_timestamp_ms(),
        }
    }

    pub fn is_event(&self) -> bool {
        matches!(self, StreamMessage::Event { .. })
    }
}

/// Tracks one open subscription; dropping it marks the subscription closed
struct SubscriptionGuard {
    id: u64,
    space_id: SpaceId,
    active: Arc<AtomicUsize>,
}

impl SubscriptionGuard {
    fn new(id: u64, space_id: SpaceId, active: Arc<AtomicUsize>) -> Self {
        active.fetch_add(1, Ordering::SeqCst);
        debug!(subscription = id, space_id = %space_id, "subscription opened");
        Self {
            id,
            space_id,
            active,
        }
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
        debug!(subscription = self.id, space_id = %self.space_id, "subscription closed");
    }
}

/// Opens live subscriptions over the shared EventStore
#[derive(Clone)]
pub struct SubscriptionManager {
    store: Arc<EventStore>,
    heartbeat_interval: Duration,
    next_id: Arc<AtomicU64>,
    active: Arc<AtomicUsize>,
    shutdown: CancellationToken,
}

impl SubscriptionManager {
    pub fn new(store: Arc<EventStore>) -> Self {
        Self::with_heartbeat_interval(store, DEFAULT_HEARTBEAT_INTERVAL)
    }

    pub fn with_heartbeat_interval(store: Arc<EventStore>, heartbeat_interval: Duration) -> Self {
        Self {
            store,
            heartbeat_interval: heartbeat_interval.max(MIN_HEARTBEAT_INTERVAL),
            next_id: Arc::new(AtomicU64::new(1)),
            active: Arc::new(AtomicUsize::new(0)),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn heartbeat_interval(&self) -> Duration {
        self.heartbeat_interval
    }

    /// Number of subscriptions currently open
    pub fn active_subscriptions(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// End every open subscription and any opened afterwards
    ///
    /// Open streams finish after their current message, which lets the
    /// transport complete the response and close the connection.
    pub fn shutdown(&self) {
        if !self.shutdown.is_cancelled() {
            debug!(active = self.active_subscriptions(), "closing live subscriptions");
        }
        self.shutdown.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Open a live subscription on a space
    ///
    /// Fails with `NotFound` for an unknown space. The returned stream ends
    /// only on [`shutdown`](Self::shutdown) or when the store goes away;
    /// drop it to close from the transport side.
    pub fn open(
        &self,
        space_id: &str,
    ) -> EventStoreResult<impl Stream<Item = StreamMessage> + Send + 'static> {
        let mut feed = open_feed(&self.store, space_id)?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let guard = SubscriptionGuard::new(id, space_id.to_string(), self.active.clone());
        let space_id = space_id.to_string();
        let period = self.heartbeat_interval;
        let shutdown = self.shutdown.clone();

        Ok(async_stream::stream! {
            let _guard = guard;

            yield StreamMessage::hello(&space_id);

            let mut heartbeat = interval_at(Instant::now() + period, period);
            heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                let message = tokio::select! {
                    _ = shutdown.cancelled() => break,
                    next = feed.next() => match next {
                        Some(event) => StreamMessage::Event { event },
                        None => break,
                    },
                    _ = heartbeat.tick() => StreamMessage::heartbeat(&space_id),
                };
                yield message;
            }
        })
    }
}
