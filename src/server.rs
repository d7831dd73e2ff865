//! Relay HTTP server lifecycle
//!
//! [`serve`] opens the event store, binds the listener and runs the Axum
//! router until Ctrl-C. Shutdown ends every open live stream first.

use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::api::{create_router, AppState};
use crate::config::RelayConfig;
use crate::event_store::{EventStore, EventStoreError};

/// Errors that can occur when starting or running the relay server
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The event store could not be opened
    #[error("event store error: {0}")]
    Store(#[from] EventStoreError),

    /// Failed to bind to the network address
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving
    #[error("serve error: {0}")]
    Serve(String),
}

/// Open the store described by `config` and build the shared state
pub fn build_state(config: &RelayConfig) -> Result<Arc<AppState>, ServerError> {
    let store = Arc::new(EventStore::with_config(config.store_config())?);
    Ok(Arc::new(AppState::new(store, config)))
}

/// Run the relay until Ctrl-C
pub async fn serve(config: RelayConfig) -> Result<(), ServerError> {
    let state = build_state(&config)?;

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| ServerError::Bind(format!("bind failed on {addr}: {e}")))?;

    info!(
        data_dir = ?config.data_dir,
        heartbeat_secs = config.heartbeat_interval.as_secs(),
        "relay configured"
    );
    serve_with_shutdown(listener, state, shutdown_signal()).await
}

/// Run the relay on an already bound listener until `signal` resolves
///
/// Open live streams are ended when the signal fires so the graceful
/// shutdown does not wait on them.
pub async fn serve_with_shutdown<F>(
    listener: TcpListener,
    state: Arc<AppState>,
    signal: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let local_addr = listener
        .local_addr()
        .map_err(|e| ServerError::Bind(e.to_string()))?;
    info!(addr = %local_addr, "relay listening");

    let subscriptions = state.subscriptions.clone();
    let router = create_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            signal.await;
            subscriptions.shutdown();
        })
        .await
        .map_err(|e| ServerError::Serve(e.to_string()))?;

    info!("relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
