use serde::{Deserialize, Serialize};

use crate::error::{KvError, KvResult};

/// Environment variable holding the maximum accepted KV value size in bytes.
pub const MAX_VALUE_SIZE_ENV: &str = "S3X_KV_MAX_VALUE_SIZE";

/// Default maximum KV value size (2 MiB).
pub const DEFAULT_MAX_VALUE_SIZE: usize = 2 * 1024 * 1024;

/// Configuration for KV-backed metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KvConfig {
    /// Largest value, in bytes, a KV store accepts.
    pub max_value_size: usize,
}

impl Default for KvConfig {
    fn default() -> Self {
        Self {
            max_value_size: DEFAULT_MAX_VALUE_SIZE,
        }
    }
}

impl KvConfig {
    /// Read the configuration from the process environment.
    ///
    /// Meant to be called once at startup. A malformed value is an error the
    /// caller must treat as fatal.
    pub fn from_env() -> KvResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> KvResult<Self> {
        match lookup(MAX_VALUE_SIZE_ENV) {
            None => Ok(Self::default()),
            Some(raw) if raw.is_empty() => Ok(Self::default()),
            Some(raw) => {
                let max_value_size = raw.trim().parse::<usize>().map_err(|e| {
                    KvError::Config(format!("parsing {MAX_VALUE_SIZE_ENV}={raw:?}: {e}"))
                })?;
                tracing::debug!(max_value_size, "KV max value size configured");
                Ok(Self { max_value_size })
            }
        }
    }
}
