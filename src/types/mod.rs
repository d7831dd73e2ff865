//! Data types for the space relay
//!
//! This module contains the core data structures shared by the store,
//! the relay core and the HTTP layer.

mod event;
mod space;

pub use event::{generate_event_id, Event, EventKey, ID_FIELD, TIMESTAMP_FIELD};
pub use space::{generate_space_id, SpaceId, SpaceMeta};
