//! HTTP server setup with Axum

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use super::rest::spaces;
use super::sse::stream_handler;
use super::state::AppState;

/// Create the Axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    // Game clients are served from anywhere
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/spaces", post(spaces::create_space).get(spaces::list_spaces))
        .route("/spaces/:id/join", post(spaces::join_space))
        .route("/spaces/:id/event", post(spaces::post_event))
        .route("/spaces/:id/snapshot", get(spaces::get_snapshot))
        .route("/spaces/:id/stream", get(stream_handler))
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RelayConfig;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use futures::StreamExt;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::util::ServiceExt;

    fn test_state() -> Arc<AppState> {
        let config = RelayConfig {
            snapshot_grace: Duration::ZERO,
            ..RelayConfig::default()
        };
        Arc::new(AppState::in_memory(&config))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = create_router(test_state());

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn test_create_space_and_list() {
        let state = test_state();
        let app = create_router(state.clone());

        let response = app
            .clone()
            .oneshot(Request::builder().method("POST").uri("/spaces").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let id = body_json(response).await["id"].as_str().unwrap().to_string();
        assert!(state.store.space_exists(&id));

        let response = app
            .oneshot(Request::builder().uri("/spaces").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let listed = body_json(response).await;
        assert_eq!(listed["spaces"][0]["id"], id);
        assert!(listed["spaces"][0]["createdAt"].as_i64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_join_is_stateless() {
        let app = create_router(test_state());
        let response = app
            .oneshot(post_json("/spaces/anything/join", json!({})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_event_then_snapshot() {
        let state = test_state();
        let space = state.store.create_space().unwrap();
        let app = create_router(state);

        let response = app
            .clone()
            .oneshot(post_json(
                &format!("/spaces/{}/event", space.id),
                json!({"move": "X", "cell": 4}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"ok": true}));

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/spaces/{}/snapshot", space.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let snapshot = body_json(response).await;
        let moves = snapshot["moves"].as_array().unwrap();
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0]["move"], "X");
        assert_eq!(moves[0]["cell"], 4);
        assert!(moves[0]["_ts"].as_i64().unwrap() > 0);
        assert!(moves[0]["_id"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_unknown_space_is_404() {
        let app = create_router(test_state());

        let response = app
            .clone()
            .oneshot(post_json("/spaces/space_nope/event", json!({"move": "X"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["code"], "NOT_FOUND");

        for path in ["/spaces/space_nope/snapshot", "/spaces/space_nope/stream"] {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", path);
        }
    }

    #[tokio::test]
    async fn test_invalid_event_body_is_400() {
        let state = test_state();
        let space = state.store.create_space().unwrap();
        let app = create_router(state.clone());

        let response = app
            .clone()
            .oneshot(post_json(&format!("/spaces/{}/event", space.id), json!([1, 2, 3])))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/spaces/{}/event", space.id))
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "INVALID_INPUT");
        assert_eq!(state.store.event_count(&space.id), Some(0));
    }

    #[tokio::test]
    async fn test_stream_opens_with_retry_then_hello() {
        let state = test_state();
        let space = state.store.create_space().unwrap();
        let app = create_router(state.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/spaces/{}/stream", space.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/event-stream"
        );
        assert_eq!(response.headers()["x-accel-buffering"], "no");

        let mut body = response.into_body().into_data_stream();
        let mut text = String::new();
        while !text.contains("hello") {
            let chunk = body.next().await.unwrap().unwrap();
            text.push_str(std::str::from_utf8(&chunk).unwrap());
        }

        assert!(text.starts_with("retry: 5000\n"));
        assert!(text.contains(r#""type":"hello""#));
        assert!(text.contains(&space.id));
        assert_eq!(state.subscriptions.active_subscriptions(), 1);

        drop(body);
        assert_eq!(state.subscriptions.active_subscriptions(), 0);
        assert_eq!(state.store.subscriber_count(&space.id), Some(0));
    }

    #[tokio::test]
    async fn test_journal_failure_is_503() {
        use crate::event_store::faults::faulty_journal;
        use crate::event_store::{EventStore, EventStoreConfig};

        let temp_dir = tempfile::TempDir::new().unwrap();
        let (journal, faults) = faulty_journal(temp_dir.path());
        let store = Arc::new(EventStore::with_journal(EventStoreConfig::in_memory(), journal).unwrap());
        let space = store.create_space().unwrap();
        let state = Arc::new(AppState::new(store, &RelayConfig::default()));
        let app = create_router(state.clone());

        faults.fail_writes(true);
        let response = app
            .clone()
            .oneshot(post_json(&format!("/spaces/{}/event", space.id), json!({"move": "X"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(response).await["code"], "STORE_UNAVAILABLE");
        assert_eq!(state.store.event_count(&space.id), Some(0));

        let response = app
            .oneshot(Request::builder().method("POST").uri("/spaces").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(state.store.list_spaces().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_journaled_posts_all_land() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = RelayConfig {
            data_dir: Some(temp_dir.path().to_path_buf()),
            snapshot_grace: Duration::ZERO,
            ..RelayConfig::default()
        };
        let state = crate::server::build_state(&config).unwrap();
        let space = state.store.create_space().unwrap();
        let app = create_router(state.clone());

        let posts: Vec<_> = (0..16)
            .map(|cell| {
                let app = app.clone();
                let uri = format!("/spaces/{}/event", space.id);
                tokio::spawn(async move { app.oneshot(post_json(&uri, json!({"cell": cell}))).await })
            })
            .collect();
        for post in posts {
            assert_eq!(post.await.unwrap().unwrap().status(), StatusCode::OK);
        }

        assert_eq!(state.store.event_count(&space.id), Some(16));
        let reopened = crate::server::build_state(&config).unwrap();
        assert_eq!(reopened.store.event_count(&space.id), Some(16));
    }
}
