//! Configuration for the synchronization core

use crate::retry::ReconnectPolicy;
use serde::{Deserialize, Serialize};

/// Configuration for the live-state synchronization core.
///
/// Embedding applications deserialize this from their own config layer;
/// every field has a sensible default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub reconnect: ReconnectPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_defaults_from_empty_config() {
        let config: SyncConfig = serde_json::from_str("{}").expect("parse");
        assert_eq!(config.reconnect.initial_delay, Duration::from_millis(1000));
        assert_eq!(config.reconnect.max_delay, Duration::from_secs(30));
    }
}
