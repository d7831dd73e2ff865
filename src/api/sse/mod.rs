//! SSE (Server-Sent Events) live streams
//!
//! `GET /spaces/:id/stream` opens a live subscription. Frames:
//! - `retry: <ms>` first, the reconnect delay
//! - `data: {"type":"hello",...}` once
//! - `data: {"type":"event","event":{...}}` per relayed event
//! - `data: {"type":"heartbeat",...}` and a `: keep-alive` comment every
//!   heartbeat interval

pub mod handler;

pub use handler::stream_handler;
