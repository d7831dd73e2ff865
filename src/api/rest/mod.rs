//! REST API module for HTTP endpoints
//!
//! - `POST /spaces` - Create a space
//! - `GET /spaces` - List known spaces
//! - `POST /spaces/:id/join` - Stateless join acknowledgment
//! - `POST /spaces/:id/event` - Submit an event
//! - `GET /spaces/:id/snapshot` - Grace-period snapshot of all events

pub mod spaces;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::event_store::EventStoreError;

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
    #[serde(skip)]
    pub status: StatusCode,
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: "NOT_FOUND".to_string(),
            status: StatusCode::NOT_FOUND,
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: "INVALID_INPUT".to_string(),
            status: StatusCode::BAD_REQUEST,
        }
    }

    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: "STORE_UNAVAILABLE".to_string(),
            status: StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: "INTERNAL_ERROR".to_string(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<EventStoreError> for ApiError {
    fn from(err: EventStoreError) -> Self {
        match err {
            EventStoreError::NotFound(_) => ApiError::not_found(err.to_string()),
            EventStoreError::InvalidInput(_) => ApiError::invalid_input(err.to_string()),
            EventStoreError::StoreUnavailable(_) => {
                error!(error = %err, "event store unavailable");
                ApiError::store_unavailable(err.to_string())
            }
            EventStoreError::Json(_) => {
                error!(error = %err, "event store serialization failure");
                ApiError::internal(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// `{ "ok": true }` acknowledgment body
#[derive(Debug, Serialize)]
pub struct Ack {
    pub ok: bool,
}

impl Ack {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}
