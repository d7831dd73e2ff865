//! Relayed game events
//!
//! An event is an opaque JSON object (a move, a reset, ...) stamped by the
//! relay with an id (`_id`) and an ingestion timestamp (`_ts`, ms epoch).
//! The relay never interprets the payload.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Wire name of the event id field
pub const ID_FIELD: &str = "_id";

/// Wire name of the ingestion timestamp field
pub const TIMESTAMP_FIELD: &str = "_ts";

/// A single relayed event belonging to one space
///
/// Serializes flat: the payload fields sit next to `_id` and `_ts`, which is
/// exactly the shape clients submitted plus the two stamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "_id", default)]
    pub id: String,

    /// Milliseconds since epoch, assigned at ingestion
    #[serde(rename = "_ts", default)]
    pub timestamp: i64,

    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Event {
    pub fn new(id: impl Into<String>, timestamp: i64, payload: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            timestamp,
            payload,
        }
    }

    /// Deduplication key, or `None` for events without an id
    pub fn key(&self) -> Option<EventKey> {
        EventKey::for_event(self)
    }

    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

/// Identity of an event for deduplication: `(id, timestamp)`
///
/// A missing timestamp counts as `0`, so two zero-timestamp events sharing
/// an id collapse into one key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventKey {
    pub id: String,
    pub timestamp: i64,
}

impl EventKey {
    pub fn new(id: impl Into<String>, timestamp: i64) -> Self {
        Self {
            id: id.into(),
            timestamp,
        }
    }

    pub fn for_event(event: &Event) -> Option<Self> {
        if event.id.is_empty() {
            return None;
        }
        Some(Self::new(event.id.clone(), event.timestamp))
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id, self.timestamp)
    }
}

/// Generate a fresh event id
pub fn generate_event_id() -> String {
    format!("ev_{}", uuid::Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_serializes_flat() {
        let payload = json!({"move": "X", "cell": 4});
        let event = Event::new("ev_1", 1700000000000, payload.as_object().unwrap().clone());

        let value = event.to_value().unwrap();
        assert_eq!(value["_id"], "ev_1");
        assert_eq!(value["_ts"], 1700000000000i64);
        assert_eq!(value["move"], "X");
        assert_eq!(value["cell"], 4);
    }

    #[test]
    fn test_event_deserialize_splits_stamps_from_payload() {
        let event: Event =
            serde_json::from_value(json!({"_id": "a", "_ts": 5, "type": "reset"})).unwrap();

        assert_eq!(event.id, "a");
        assert_eq!(event.timestamp, 5);
        assert_eq!(event.payload.len(), 1);
        assert_eq!(event.payload["type"], "reset");
    }

    #[test]
    fn test_missing_timestamp_defaults_to_zero() {
        let event: Event = serde_json::from_value(json!({"_id": "a"})).unwrap();
        assert_eq!(event.key(), Some(EventKey::new("a", 0)));
    }

    #[test]
    fn test_event_without_id_has_no_key() {
        let event: Event = serde_json::from_value(json!({"_ts": 9, "move": "O"})).unwrap();
        assert!(event.key().is_none());
    }

    #[test]
    fn test_key_display() {
        assert_eq!(EventKey::new("abc", 42).to_string(), "abc:42");
    }

    #[test]
    fn test_generated_ids_are_distinct() {
        let a = generate_event_id();
        let b = generate_event_id();
        assert!(a.starts_with("ev_"));
        assert_ne!(a, b);
    }
}
