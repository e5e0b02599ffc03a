use async_trait::async_trait;
use s3x_types::ContentHash;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::StoreResult;

/// Content-addressed blob store.
///
/// All implementations must satisfy these invariants:
/// - Blobs are immutable once written; the same bytes always produce the
///   same [`ContentHash`].
/// - Uploads are all-or-nothing: if any part of the stream is rejected, no
///   blob becomes addressable.
/// - Downloads stream only the requested range and stop at the first
///   failed write to the sink.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Consume `reader` to its end and store the bytes.
    ///
    /// Returns the content address and the number of bytes stored.
    async fn upload(
        &self,
        reader: &mut (dyn AsyncRead + Unpin + Send),
    ) -> StoreResult<(ContentHash, u64)>;

    /// Write `length` bytes of blob `hash`, starting at `offset`, to `writer`.
    ///
    /// Returns the number of bytes written.
    async fn download(
        &self,
        writer: &mut (dyn AsyncWrite + Unpin + Send),
        hash: &ContentHash,
        offset: u64,
        length: u64,
    ) -> StoreResult<u64>;
}
