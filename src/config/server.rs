use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::store::DEFAULT_MAX_VALUE_BYTES;

/// Data-plane server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Bind address of the configuration synchronization listener
    pub bind: std::net::SocketAddr,
    /// Number of data-plane worker tasks
    pub workers: Option<usize>,
    /// Seconds between a worker's backend reconciliation passes
    pub sync_interval: Option<u64>,
    /// Largest configuration payload accepted by the store, in bytes
    pub max_payload_bytes: Option<usize>,
}

impl ServerConfig {
    /// Get the reconciliation interval as Duration (default: 1s)
    pub fn get_sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval.unwrap_or(1))
    }

    /// Get the payload bound for the shared state store
    pub fn get_max_payload_bytes(&self) -> usize {
        self.max_payload_bytes.unwrap_or(DEFAULT_MAX_VALUE_BYTES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_and_payload_defaults() {
        let config = ServerConfig {
            bind: "127.0.0.1:10246".parse().unwrap(),
            workers: None,
            sync_interval: None,
            max_payload_bytes: None,
        };
        assert_eq!(config.get_sync_interval(), Duration::from_secs(1));
        assert_eq!(config.get_max_payload_bytes(), DEFAULT_MAX_VALUE_BYTES);

        let tuned = ServerConfig {
            sync_interval: Some(5),
            max_payload_bytes: Some(1024),
            ..config
        };
        assert_eq!(tuned.get_sync_interval(), Duration::from_secs(5));
        assert_eq!(tuned.get_max_payload_bytes(), 1024);
    }
}
