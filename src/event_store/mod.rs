//! Event Store Module
//!
//! Durable, per-space event data for the relay:
//! - `EventStore`: space registry, append-only event logs and live fan-out
//! - `Journal`: optional JSONL persistence replayed on start
//!
//! # Architecture
//!
//! ```text
//! Write Path:
//! ┌─────────┐    ┌───────────────┐    ┌──────────────┐    ┌─────────────────┐
//! │ client  │───►│ stamp _id/_ts │───►│ journal line │───►│ log + broadcast │
//! │ POST    │    │               │    │ (if enabled) │    │ to subscribers  │
//! └─────────┘    └───────────────┘    └──────────────┘    └─────────────────┘
//!
//! Read Path:
//! ┌──────────────┐    ┌──────────────────────────────┐
//! │ read_all()   │    │ subscribe(): history + live  │
//! └──────────────┘    └──────────────────────────────┘
//! ```

mod error;
mod journal;
mod store;

pub use error::{EventStoreError, EventStoreResult};
pub use journal::{Journal, JournalRecord, JournalWriter};

#[cfg(test)]
pub(crate) use journal::faults;
pub use store::{event_from_payload, EventStore, EventStoreConfig};
