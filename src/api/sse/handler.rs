//! SSE stream handler

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header::HeaderName, HeaderValue},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
};
use futures::StreamExt;
use tracing::warn;

use crate::api::rest::ApiError;
use crate::api::state::AppState;

/// GET /spaces/:id/stream - Live event stream for a space
///
/// Unknown spaces are rejected with 404 before the stream opens. Once open
/// the stream runs until the client disconnects; axum then drops it, which
/// closes the subscription.
pub async fn stream_handler(
    State(state): State<Arc<AppState>>,
    Path(space_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let subscription = state.subscriptions.open(&space_id)?;
    let mut subscription = Box::pin(subscription);
    let retry = state.retry;

    let stream = async_stream::stream! {
        yield Ok::<_, Infallible>(Event::default().retry(retry));

        while let Some(message) = subscription.next().await {
            match Event::default().json_data(&message) {
                Ok(event) => yield Ok(event),
                Err(e) => {
                    // Skip the message, keep the stream alive
                    warn!(space_id = %space_id, error = %e, "failed to encode stream message");
                }
            }
        }
    };

    let sse = Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(state.heartbeat_interval())
            .text("keep-alive"),
    );

    // Tells nginx and friends not to buffer the stream
    let no_buffering = [(
        HeaderName::from_static("x-accel-buffering"),
        HeaderValue::from_static("no"),
    )];

    Ok((no_buffering, sse))
}
