//! Deduplicated event feed of one space
//!
//! A feed replays the space's history and then continues with live appends
//! as one ordered sequence. Deduplication is part of consuming the feed: the
//! seen set lives inside it, so a re-emitted event (for instance after a
//! lagging receiver resynchronises from the full log) is dropped before it
//! reaches the consumer.

use std::pin::Pin;
use std::sync::Arc;

use futures::Stream;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use super::dedup::{Observation, SeenSet};
use crate::event_store::{EventStore, EventStoreResult};
use crate::types::Event;

/// Unbounded sequence of distinct events: history first, then live
pub type EventFeed = Pin<Box<dyn Stream<Item = Event> + Send + 'static>>;

/// Open a feed on a space
///
/// History and the live receiver are captured right away, so events
/// appended after this call returns are guaranteed to be delivered.
/// Fails with `NotFound` for an unknown space.
pub fn open_feed(store: &Arc<EventStore>, space_id: &str) -> EventStoreResult<EventFeed> {
    let (history, mut rx) = store.subscribe(space_id)?;
    let store = Arc::clone(store);
    let space_id = space_id.to_string();

    let feed = async_stream::stream! {
        let mut seen = SeenSet::new();

        for event in history {
            if seen.observe_event(&event) == Observation::New {
                yield event;
            }
        }

        loop {
            match rx.recv().await {
                Ok(event) => {
                    if seen.observe_event(&event) == Observation::New {
                        yield event;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(space_id = %space_id, skipped, "feed lagged, resyncing from log");
                    let events = match store.read_all(&space_id) {
                        Ok(events) => events,
                        Err(e) => {
                            warn!(space_id = %space_id, error = %e, "resync failed, closing feed");
                            break;
                        }
                    };
                    for event in events {
                        if seen.observe_event(&event) == Observation::New {
                            yield event;
                        }
                    }
                }
                Err(RecvError::Closed) => {
                    debug!(space_id = %space_id, "space channel closed");
                    break;
                }
            }
        }
    };

    Ok(Box::pin(feed))
}
