//! Deduplication of observed events
//!
//! Each consumer keeps its own [`SeenSet`]. Checking and recording a key is
//! a single `HashSet::insert`, so the same event can never be reported as
//! new twice to one consumer.

use std::collections::HashSet;

use crate::types::{Event, EventKey};

/// Outcome of observing an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    New,
    Duplicate,
}

/// Per-consumer set of already delivered `(id, timestamp)` keys
#[derive(Debug, Default)]
pub struct SeenSet {
    keys: HashSet<EventKey>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `key`, reporting whether it had been seen before
    pub fn observe(&mut self, key: EventKey) -> Observation {
        if self.keys.insert(key) {
            Observation::New
        } else {
            Observation::Duplicate
        }
    }

    /// Record an event; events without an id are reported as duplicates
    /// and never delivered
    pub fn observe_event(&mut self, event: &Event) -> Observation {
        match event.key() {
            Some(key) => self.observe(key),
            None => Observation::Duplicate,
        }
    }

    pub fn contains(&self, key: &EventKey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    #[test]
    fn test_first_observation_is_new() {
        let mut seen = SeenSet::new();
        assert_eq!(seen.observe(EventKey::new("a", 1)), Observation::New);
        assert_eq!(seen.observe(EventKey::new("a", 1)), Observation::Duplicate);
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn test_same_id_different_timestamp_is_distinct() {
        let mut seen = SeenSet::new();
        assert_eq!(seen.observe(EventKey::new("a", 1)), Observation::New);
        assert_eq!(seen.observe(EventKey::new("a", 2)), Observation::New);
    }

    #[test]
    fn test_zero_timestamp_events_with_same_id_collapse() {
        let mut seen = SeenSet::new();
        let first = Event::new("a", 0, Map::new());
        let mut second = Event::new("a", 0, Map::new());
        second.payload.insert("move".to_string(), "X".into());

        assert_eq!(seen.observe_event(&first), Observation::New);
        assert_eq!(seen.observe_event(&second), Observation::Duplicate);
    }

    #[test]
    fn test_event_without_id_is_never_new() {
        let mut seen = SeenSet::new();
        let event = Event::new("", 5, Map::new());
        assert_eq!(seen.observe_event(&event), Observation::Duplicate);
        assert!(seen.is_empty());
    }
}
