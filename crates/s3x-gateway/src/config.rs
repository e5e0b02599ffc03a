use serde::{Deserialize, Serialize};

use s3x_kv::{KvConfig, KvError};

use crate::error::{GatewayError, GatewayResult};

/// Environment variable that turns on deterministic timestamps.
pub const DETERMINISTIC_TIMESTAMPS_ENV: &str = "S3X_DETERMINISTIC_TIMESTAMPS";

/// Configuration for the gateway, injected at construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// When `true`, new and copied objects carry no modification time, so
    /// records and fixtures are reproducible byte for byte.
    pub deterministic_timestamps: bool,
    /// Maximum number of ledger entries fetched per ListObjectsV2 call.
    pub list_page_limit: usize,
    /// Capacity of the in-memory pipe between a download task and its reader.
    pub pipe_buffer_size: usize,
    /// Limits for KV-backed metadata.
    pub kv: KvConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            deterministic_timestamps: false,
            list_page_limit: 1000,
            pipe_buffer_size: 64 * 1024,
            kv: KvConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Configuration for reproducible tests: no wall-clock timestamps.
    pub fn deterministic() -> Self {
        Self {
            deterministic_timestamps: true,
            ..Default::default()
        }
    }

    /// Read the configuration from the process environment.
    ///
    /// Meant to be called once at startup; any error is fatal to the caller.
    pub fn from_env() -> GatewayResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> GatewayResult<Self> {
        let kv = KvConfig::from_lookup(&lookup).map_err(|e| match e {
            KvError::Config(msg) => GatewayError::Config(msg),
            other => GatewayError::Config(other.to_string()),
        })?;
        let deterministic_timestamps = match lookup(DETERMINISTIC_TIMESTAMPS_ENV).as_deref() {
            None | Some("") | Some("0") | Some("false") => false,
            Some("1") | Some("true") => true,
            Some(other) => {
                return Err(GatewayError::Config(format!(
                    "{DETERMINISTIC_TIMESTAMPS_ENV} must be true/false/1/0, got {other:?}"
                )))
            }
        };
        Ok(Self {
            deterministic_timestamps,
            kv,
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use s3x_kv::MAX_VALUE_SIZE_ENV;

    #[test]
    fn default_config() {
        let c = GatewayConfig::default();
        assert!(!c.deterministic_timestamps);
        assert_eq!(c.list_page_limit, 1000);
        assert_eq!(c.pipe_buffer_size, 64 * 1024);
        assert_eq!(c.kv.max_value_size, 2 * 1024 * 1024);
    }

    #[test]
    fn deterministic_preset() {
        assert!(GatewayConfig::deterministic().deterministic_timestamps);
    }

    #[test]
    fn from_empty_environment() {
        let c = GatewayConfig::from_lookup(|_| None).unwrap();
        assert_eq!(c, GatewayConfig::default());
    }

    #[test]
    fn from_populated_environment() {
        let c = GatewayConfig::from_lookup(|key| match key {
            MAX_VALUE_SIZE_ENV => Some("1024".into()),
            DETERMINISTIC_TIMESTAMPS_ENV => Some("true".into()),
            _ => None,
        })
        .unwrap();
        assert!(c.deterministic_timestamps);
        assert_eq!(c.kv.max_value_size, 1024);
    }

    #[test]
    fn malformed_kv_size_is_fatal() {
        let err = GatewayConfig::from_lookup(|key| {
            (key == MAX_VALUE_SIZE_ENV).then(|| "lots".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));
    }

    #[test]
    fn malformed_flag_is_fatal() {
        let err = GatewayConfig::from_lookup(|key| {
            (key == DETERMINISTIC_TIMESTAMPS_ENV).then(|| "maybe".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));
    }

    #[test]
    fn serde_roundtrip() {
        let c = GatewayConfig::deterministic();
        let json = serde_json::to_string(&c).unwrap();
        let parsed: GatewayConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, c);
    }
}
