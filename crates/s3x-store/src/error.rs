use s3x_types::ContentHash;

/// Errors from content store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested blob was not found.
    #[error("blob not found: {0}")]
    NotFound(ContentHash),

    /// The requested byte range lies outside the blob.
    #[error("range {offset}+{length} is outside blob {hash} of {size} bytes")]
    RangeOutOfBounds {
        hash: ContentHash,
        offset: u64,
        length: u64,
        size: u64,
    },

    /// I/O error while reading the upload or writing the download sink.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Storage backend is read-only or otherwise refusing writes.
    #[error("store is read-only")]
    ReadOnly,
}

impl StoreError {
    /// Returns `true` if the error came from a sink whose reader went away.
    pub fn is_broken_pipe(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == std::io::ErrorKind::BrokenPipe)
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
