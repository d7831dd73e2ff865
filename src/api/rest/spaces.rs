//! Space endpoints

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use serde_json::Value;

use super::{Ack, ApiError};
use crate::api::state::AppState;
use crate::event_store::EventStoreResult;
use crate::types::{Event, SpaceId, SpaceMeta};

/// Response for POST /spaces
#[derive(Debug, Serialize)]
pub struct CreatedSpace {
    pub id: SpaceId,
}

/// Response for GET /spaces
#[derive(Debug, Serialize)]
pub struct SpaceList {
    pub spaces: Vec<SpaceMeta>,
}

/// Response for GET /spaces/:id/snapshot
#[derive(Debug, Serialize)]
pub struct Snapshot {
    pub moves: Vec<Event>,
}

/// POST /spaces - Create a new space
pub async fn create_space(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let store = state.store.clone();
    let meta = run_blocking(move || store.create_space()).await?;
    Ok(Json(CreatedSpace { id: meta.id }))
}

/// GET /spaces - List known spaces
pub async fn list_spaces(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(SpaceList {
        spaces: state.store.list_spaces(),
    })
}

/// POST /spaces/:id/join - Stateless acknowledgment
pub async fn join_space(Path(_space_id): Path<String>) -> impl IntoResponse {
    Json(Ack::ok())
}

/// POST /spaces/:id/event - Stamp and append an event
///
/// An empty body is treated as `{}`.
pub async fn post_event(
    State(state): State<Arc<AppState>>,
    Path(space_id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let payload = parse_body(&body)?;
    let store = state.store.clone();
    run_blocking(move || store.append_payload(&space_id, payload)).await?;
    Ok(Json(Ack::ok()))
}

/// GET /spaces/:id/snapshot - All events after the grace period
pub async fn get_snapshot(
    State(state): State<Arc<AppState>>,
    Path(space_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let moves = state.snapshots.snapshot(&space_id).await?;
    Ok(Json(Snapshot { moves }))
}

/// Run a journaling store write off the async workers
///
/// The journal syncs to disk under the store's write lock.
async fn run_blocking<T, F>(write: F) -> Result<T, ApiError>
where
    F: FnOnce() -> EventStoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    let result = tokio::task::spawn_blocking(write)
        .await
        .map_err(|e| ApiError::internal(format!("store write task failed: {}", e)))?;
    Ok(result?)
}

fn parse_body(body: &[u8]) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_slice(body).map_err(|e| ApiError::invalid_input(format!("malformed JSON body: {}", e)))
}
