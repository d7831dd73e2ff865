//! Space Relay
//!
//! An event relay for two-player grid games. Clients share moves and resets
//! through a server-side, per-space event log instead of peer connections.
//!
//! # Features
//!
//! - **Append-only spaces**: events stamped with `_id` and `_ts` on ingestion
//! - **Snapshots**: grace-period reads tolerant of replication lag
//! - **Live streams**: SSE subscriptions replaying history then live events,
//!   deduplicated per subscriber, with heartbeats and reconnect hints
//! - **Journal**: optional JSONL persistence replayed on restart
//!
//! # Modules
//!
//! - `types`: Event, EventKey and space metadata
//! - `event_store`: space registry, event logs and journal
//! - `relay`: dedup, feeds, snapshots and live subscriptions
//! - `api`: Axum router, REST handlers and SSE stream
//! - `config`: environment-driven configuration
//! - `server`: listener and shutdown handling
//!
//! # Example
//!
//! ```no_run
//! use space_relay::{serve, RelayConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     serve(RelayConfig::from_env()).await.unwrap();
//! }
//! ```

pub mod api;
pub mod config;
pub mod event_store;
pub mod logging;
pub mod relay;
pub mod server;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use api::{create_router, AppState};
pub use config::RelayConfig;
pub use event_store::{EventStore, EventStoreConfig, EventStoreError, EventStoreResult};
pub use relay::{SnapshotAssembler, StreamMessage, SubscriptionManager};
pub use server::{serve, ServerError};
pub use types::{Event, EventKey, SpaceId, SpaceMeta};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
