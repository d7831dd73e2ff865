//! Space Relay - Binary Entry Point
//!
//! This is the main entry point for the relay-server binary.

use space_relay::logging::init_logging;
use space_relay::{serve, RelayConfig, ServerError};

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    init_logging();

    let config = RelayConfig::from_env();
    serve(config).await
}
