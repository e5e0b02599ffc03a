/// Errors from KV namespace operations.
#[derive(Debug, thiserror::Error)]
pub enum KvError {
    /// The value exceeds the configured maximum value size.
    #[error("value too long: {size} bytes exceeds the {max} byte limit")]
    ValueTooLarge { size: usize, max: usize },

    /// The key is not present in the store.
    #[error("key not found: {0}")]
    NotFound(String),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid startup configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result alias for KV operations.
pub type KvResult<T> = Result<T, KvError>;
