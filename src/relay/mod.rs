//! Relay core
//!
//! Everything between the store and the transport:
//! - `dedup`: per-consumer seen sets keyed by `(id, timestamp)`
//! - `feed`: history-then-live event sequence with built-in dedup
//! - `snapshot`: grace-period snapshot reads
//! - `subscription`: live subscriptions with hello and heartbeats

pub mod dedup;
pub mod feed;
pub mod snapshot;
pub mod subscription;

pub use dedup::{Observation, SeenSet};
pub use feed::{open_feed, EventFeed};
pub use snapshot::{SnapshotAssembler, DEFAULT_GRACE_PERIOD};
pub use subscription::{
    StreamMessage, SubscriptionManager, DEFAULT_HEARTBEAT_INTERVAL, MIN_HEARTBEAT_INTERVAL,
};
