//! API module for HTTP and SSE endpoints
//!
//! This module provides the REST surface and the live event streams game
//! clients use to share a space.

pub mod http;
pub mod rest;
pub mod sse;
pub mod state;

pub use http::create_router;
pub use state::AppState;
