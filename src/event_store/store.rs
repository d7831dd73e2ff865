//! Event Store - per-space append-only event logs
//!
//! The EventStore owns the space registry, the events of every space and
//! the live fan-out channel each space publishes appends on. All of it sits
//! behind a single lock so that an append, its journal record and its
//! broadcast happen as one step relative to readers and subscribers.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::error::{EventStoreError, EventStoreResult};
use super::journal::{Journal, JournalRecord};
use crate::types::{
    generate_event_id, generate_space_id, Event, SpaceId, SpaceMeta, ID_FIELD, TIMESTAMP_FIELD,
};
use crate::utils::current_timestamp_ms;

/// Configuration for the EventStore
#[derive(Debug, Clone)]
pub struct EventStoreConfig {
    /// Journal directory; `None` keeps everything in memory
    pub data_dir: Option<PathBuf>,
    /// Per-space broadcast buffer for live subscribers
    pub channel_capacity: usize,
}

impl Default for EventStoreConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            channel_capacity: 1024,
        }
    }
}

impl EventStoreConfig {
    /// Memory-only store
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Store journaled under `data_dir`
    pub fn with_data_dir<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: Some(data_dir.as_ref().to_path_buf()),
            ..Default::default()
        }
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Get path to events.jsonl, if journaling is enabled
    pub fn events_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join(Journal::FILE_NAME))
    }
}

/// Events and live channel of one space
struct SpaceLog {
    meta: SpaceMeta,
    events: Vec<Event>,
    tx: broadcast::Sender<Event>,
}

impl SpaceLog {
    fn new(meta: SpaceMeta, capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            meta,
            events: Vec::new(),
            tx,
        }
    }
}

struct Inner {
    spaces: HashMap<SpaceId, SpaceLog>,
    journal: Option<Journal>,
}

/// Shared, process-wide store of spaces and their events
pub struct EventStore {
    config: EventStoreConfig,
    inner: RwLock<Inner>,
}

impl EventStore {
    /// Create a memory-only EventStore
    pub fn new() -> Self {
        Self::from_parts(EventStoreConfig::in_memory(), None)
    }

    /// Create an EventStore with custom config
    ///
    /// With a data directory configured the journal is opened and replayed,
    /// so spaces and events survive restarts.
    pub fn with_config(config: EventStoreConfig) -> EventStoreResult<Self> {
        match &config.data_dir {
            Some(dir) => {
                let journal = Journal::open(dir)?;
                Self::with_journal(config, journal)
            }
            None => Ok(Self::from_parts(config, None)),
        }
    }

    /// Create an EventStore over an already opened journal, replaying it
    pub fn with_journal(config: EventStoreConfig, journal: Journal) -> EventStoreResult<Self> {
        let records = journal.load()?;
        let store = Self::from_parts(config, Some(journal));
        store.replay(records);
        Ok(store)
    }

    fn from_parts(config: EventStoreConfig, journal: Option<Journal>) -> Self {
        Self {
            config,
            inner: RwLock::new(Inner {
                spaces: HashMap::new(),
                journal,
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &EventStoreConfig {
        &self.config
    }

    fn replay(&self, records: Vec<JournalRecord>) {
        let capacity = self.config.channel_capacity;
        let mut inner = self.inner.write();
        let mut event_count = 0usize;

        for record in records {
            match record {
                JournalRecord::SpaceCreated {
                    space_id,
                    created_at,
                } => {
                    inner
                        .spaces
                        .entry(space_id.clone())
                        .or_insert_with(|| SpaceLog::new(SpaceMeta::new(space_id, created_at), capacity));
                }
                JournalRecord::EventAppended { space_id, event } => {
                    let log = inner.spaces.entry(space_id.clone()).or_insert_with(|| {
                        warn!(space_id = %space_id, "journal event for unregistered space, registering it");
                        SpaceLog::new(SpaceMeta::new(space_id.clone(), event.timestamp), capacity)
                    });
                    log.events.push(event);
                    event_count += 1;
                }
            }
        }

        if inner.journal.is_some() {
            info!(
                spaces = inner.spaces.len(),
                events = event_count,
                "replayed event journal"
            );
        }
    }

    /// Create a new space with a fresh unique id
    pub fn create_space(&self) -> EventStoreResult<SpaceMeta> {
        let mut inner = self.inner.write();

        let mut id = generate_space_id();
        while inner.spaces.contains_key(&id) {
            id = generate_space_id();
        }
        let meta = SpaceMeta::new(id, current_timestamp_ms());

        if let Some(journal) = inner.journal.as_mut() {
            journal.append(&JournalRecord::SpaceCreated {
                space_id: meta.id.clone(),
                created_at: meta.created_at,
            })?;
        }

        inner.spaces.insert(
            meta.id.clone(),
            SpaceLog::new(meta.clone(), self.config.channel_capacity),
        );

        info!(space_id = %meta.id, "space created");
        Ok(meta)
    }

    /// Append an event to a space
    ///
    /// Stamps the ingestion time (overwriting any caller value) and assigns
    /// an id when the event has none. The event is journaled before it
    /// becomes visible; a journal failure leaves the space untouched.
    pub fn append(&self, space_id: &str, mut event: Event) -> EventStoreResult<Event> {
        let mut inner = self.inner.write();
        let inner = &mut *inner;

        let log = inner
            .spaces
            .get_mut(space_id)
            .ok_or_else(|| EventStoreError::NotFound(space_id.to_string()))?;

        if event.id.is_empty() {
            event.id = generate_event_id();
        }
        event.timestamp = current_timestamp_ms();

        if let Some(journal) = inner.journal.as_mut() {
            journal.append(&JournalRecord::EventAppended {
                space_id: space_id.to_string(),
                event: event.clone(),
            })?;
        }

        log.events.push(event.clone());
        // Ignore send errors - they just mean no subscribers are listening
        let _ = log.tx.send(event.clone());

        debug!(space_id, event_id = %event.id, ts = event.timestamp, "event appended");
        Ok(event)
    }

    /// Validate a raw JSON body and append it as an event
    pub fn append_payload(&self, space_id: &str, payload: Value) -> EventStoreResult<Event> {
        let event = event_from_payload(payload)?;
        self.append(space_id, event)
    }

    /// Every event recorded for the space, in append order
    pub fn read_all(&self, space_id: &str) -> EventStoreResult<Vec<Event>> {
        let inner = self.inner.read();
        inner
            .spaces
            .get(space_id)
            .map(|log| log.events.clone())
            .ok_or_else(|| EventStoreError::NotFound(space_id.to_string()))
    }

    /// Snapshot of the history plus a receiver for everything appended after
    ///
    /// Both are taken under the lock appends use, so no event can fall
    /// between the history and the live receiver.
    pub fn subscribe(&self, space_id: &str) -> EventStoreResult<(Vec<Event>, broadcast::Receiver<Event>)> {
        let inner = self.inner.read();
        let log = inner
            .spaces
            .get(space_id)
            .ok_or_else(|| EventStoreError::NotFound(space_id.to_string()))?;

        Ok((log.events.clone(), log.tx.subscribe()))
    }

    pub fn space_exists(&self, space_id: &str) -> bool {
        self.inner.read().spaces.contains_key(space_id)
    }

    pub fn get_space(&self, space_id: &str) -> Option<SpaceMeta> {
        self.inner.read().spaces.get(space_id).map(|log| log.meta.clone())
    }

    /// All known spaces, oldest first
    pub fn list_spaces(&self) -> Vec<SpaceMeta> {
        let inner = self.inner.read();
        let mut spaces: Vec<SpaceMeta> = inner.spaces.values().map(|log| log.meta.clone()).collect();
        spaces.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        spaces
    }

    /// Number of live receivers attached to a space
    pub fn subscriber_count(&self, space_id: &str) -> Option<usize> {
        self.inner
            .read()
            .spaces
            .get(space_id)
            .map(|log| log.tx.receiver_count())
    }

    pub fn event_count(&self, space_id: &str) -> Option<usize> {
        self.inner.read().spaces.get(space_id).map(|log| log.events.len())
    }
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn a submitted JSON body into an unstamped Event
///
/// The body must be an object. `_id` may be absent, null or empty (an id is
/// generated) or a string; anything else is rejected. `_ts` is discarded.
pub fn event_from_payload(payload: Value) -> EventStoreResult<Event> {
    let mut payload = match payload {
        Value::Object(map) => map,
        other => {
            return Err(EventStoreError::InvalidInput(format!(
                "event body must be a JSON object, got {}",
                json_kind(&other)
            )))
        }
    };

    let id = match payload.remove(ID_FIELD) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(id)) => id,
        Some(other) => {
            return Err(EventStoreError::InvalidInput(format!(
                "{} must be a string, got {}",
                ID_FIELD,
                json_kind(&other)
            )))
        }
    };
    payload.remove(TIMESTAMP_FIELD);

    Ok(Event::new(id, 0, payload))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
