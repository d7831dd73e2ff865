//! Relay configuration
//!
//! Environment:
//! - RELAY_HOST: bind host (default 0.0.0.0)
//! - RELAY_PORT or PORT: bind port (default 8765, RELAY_PORT wins)
//! - RELAY_DATA_DIR: journal directory (default unset, memory only)
//! - RELAY_SNAPSHOT_GRACE_MS: snapshot grace period (default 200)
//! - RELAY_HEARTBEAT_SECS: live stream heartbeat interval (default 15)
//! - RELAY_RETRY_MS: reconnect delay advertised to stream clients (default 5000)
//! - RELAY_CHANNEL_CAPACITY: per-space live buffer (default 1024)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::event_store::EventStoreConfig;
use crate::relay::{DEFAULT_GRACE_PERIOD, DEFAULT_HEARTBEAT_INTERVAL};

/// Default reconnect delay advertised on live streams
pub const DEFAULT_RETRY: Duration = Duration::from_millis(5000);

/// Runtime configuration of the relay server
#[derive(Debug, Clone, PartialEq)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: Option<PathBuf>,
    pub snapshot_grace: Duration,
    pub heartbeat_interval: Duration,
    pub retry: Duration,
    pub channel_capacity: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8765,
            data_dir: None,
            snapshot_grace: DEFAULT_GRACE_PERIOD,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            retry: DEFAULT_RETRY,
            channel_capacity: 1024,
        }
    }
}

impl RelayConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create from an arbitrary key lookup
    ///
    /// Unparseable values are ignored with a warning and the default kept.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("RELAY_HOST").filter(|h| !h.trim().is_empty()) {
            config.host = host.trim().to_string();
        }

        for key in ["PORT", "RELAY_PORT"] {
            if let Some(port) = parse_var::<u16, _>(&lookup, key) {
                config.port = port;
            }
        }

        if let Some(dir) = lookup("RELAY_DATA_DIR").filter(|d| !d.trim().is_empty()) {
            config.data_dir = Some(PathBuf::from(dir.trim()));
        }

        if let Some(ms) = parse_var::<u64, _>(&lookup, "RELAY_SNAPSHOT_GRACE_MS") {
            config.snapshot_grace = Duration::from_millis(ms);
        }

        if let Some(secs) = parse_var::<u64, _>(&lookup, "RELAY_HEARTBEAT_SECS") {
            if secs == 0 {
                warn!("RELAY_HEARTBEAT_SECS must be positive, keeping default");
            } else {
                config.heartbeat_interval = Duration::from_secs(secs);
            }
        }

        if let Some(ms) = parse_var::<u64, _>(&lookup, "RELAY_RETRY_MS") {
            config.retry = Duration::from_millis(ms);
        }

        if let Some(capacity) = parse_var::<usize, _>(&lookup, "RELAY_CHANNEL_CAPACITY") {
            config.channel_capacity = capacity.max(1);
        }

        config
    }

    /// `host:port` to bind
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn store_config(&self) -> EventStoreConfig {
        EventStoreConfig {
            data_dir: self.data_dir.clone(),
            channel_capacity: self.channel_capacity,
        }
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparseable configuration value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RelayConfig::from_lookup(|_| None);
        assert_eq!(config, RelayConfig::default());
        assert_eq!(config.bind_addr(), "0.0.0.0:8765");
        assert_eq!(config.snapshot_grace, Duration::from_millis(200));
        assert_eq!(config.heartbeat_interval, Duration::from_secs(15));
        assert_eq!(config.retry, Duration::from_millis(5000));
    }

    #[test]
    fn test_overrides() {
        let config = RelayConfig::from_lookup(lookup_from(&[
            ("RELAY_HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("RELAY_DATA_DIR", "/tmp/relay"),
            ("RELAY_SNAPSHOT_GRACE_MS", "50"),
            ("RELAY_HEARTBEAT_SECS", "3"),
            ("RELAY_RETRY_MS", "1000"),
            ("RELAY_CHANNEL_CAPACITY", "16"),
        ]));

        assert_eq!(config.bind_addr(), "127.0.0.1:9000");
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/relay")));
        assert_eq!(config.snapshot_grace, Duration::from_millis(50));
        assert_eq!(config.heartbeat_interval, Duration::from_secs(3));
        assert_eq!(config.retry, Duration::from_millis(1000));
        assert_eq!(config.store_config().channel_capacity, 16);
    }

    #[test]
    fn test_relay_port_wins_over_port() {
        let config = RelayConfig::from_lookup(lookup_from(&[("PORT", "9000"), ("RELAY_PORT", "9100")]));
        assert_eq!(config.port, 9100);
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = RelayConfig::from_lookup(lookup_from(&[
            ("PORT", "not-a-port"),
            ("RELAY_HEARTBEAT_SECS", "0"),
            ("RELAY_SNAPSHOT_GRACE_MS", "-5"),
        ]));
        assert_eq!(config, RelayConfig::default());
    }
}
