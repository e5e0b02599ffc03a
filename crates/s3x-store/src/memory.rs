use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use s3x_types::ContentHash;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{StoreError, StoreResult};
use crate::hasher::ContentHasher;
use crate::traits::ContentStore;

/// Size of the chunks uploads are read in and downloads are written in.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// In-memory, HashMap-based content store.
///
/// Intended for tests and embedding. Blobs are held as [`Bytes`] so a
/// download clones a reference out of the lock and streams from it without
/// holding the lock across writes.
pub struct InMemoryContentStore {
    blobs: RwLock<HashMap<ContentHash, Bytes>>,
    read_only: AtomicBool,
    bytes_served: AtomicU64,
}

impl InMemoryContentStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            read_only: AtomicBool::new(false),
            bytes_served: AtomicU64::new(0),
        }
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.blobs.read().expect("lock poisoned").is_empty()
    }

    /// Returns `true` if a blob with this address is stored.
    pub fn contains(&self, hash: &ContentHash) -> bool {
        self.blobs.read().expect("lock poisoned").contains_key(hash)
    }

    /// Total bytes across all stored blobs.
    pub fn total_bytes(&self) -> u64 {
        self.blobs
            .read()
            .expect("lock poisoned")
            .values()
            .map(|blob| blob.len() as u64)
            .sum()
    }

    /// Total bytes successfully written to download sinks so far.
    pub fn bytes_served(&self) -> u64 {
        self.bytes_served.load(Ordering::SeqCst)
    }

    /// Make every subsequent upload fail with [`StoreError::ReadOnly`].
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    fn blob(&self, hash: &ContentHash) -> StoreResult<Bytes> {
        self.blobs
            .read()
            .expect("lock poisoned")
            .get(hash)
            .cloned()
            .ok_or(StoreError::NotFound(*hash))
    }
}

impl Default for InMemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn upload(
        &self,
        reader: &mut (dyn AsyncRead + Unpin + Send),
    ) -> StoreResult<(ContentHash, u64)> {
        let mut hasher = ContentHasher::new();
        let mut data = Vec::new();
        let mut chunk = vec![0u8; CHUNK_SIZE];
        loop {
            let n = reader.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            hasher.update(&chunk[..n]);
            data.extend_from_slice(&chunk[..n]);
        }
        // Checked only after the stream is drained so a rejected upload
        // never leaves a partial blob behind.
        if self.read_only.load(Ordering::SeqCst) {
            return Err(StoreError::ReadOnly);
        }
        let (hash, size) = hasher.finalize();
        let mut map = self.blobs.write().expect("lock poisoned");
        map.entry(hash).or_insert_with(|| Bytes::from(data));
        tracing::debug!(hash = %hash.short_hex(), size, "blob stored");
        Ok((hash, size))
    }

    async fn download(
        &self,
        writer: &mut (dyn AsyncWrite + Unpin + Send),
        hash: &ContentHash,
        offset: u64,
        length: u64,
    ) -> StoreResult<u64> {
        let blob = self.blob(hash)?;
        let size = blob.len() as u64;
        let end = offset.checked_add(length).filter(|end| *end <= size);
        let Some(end) = end else {
            return Err(StoreError::RangeOutOfBounds {
                hash: *hash,
                offset,
                length,
                size,
            });
        };

        let range = blob.slice(offset as usize..end as usize);
        let mut written = 0u64;
        for chunk in range.chunks(CHUNK_SIZE) {
            writer.write_all(chunk).await?;
            written += chunk.len() as u64;
            self.bytes_served
                .fetch_add(chunk.len() as u64, Ordering::SeqCst);
        }
        writer.flush().await?;
        Ok(written)
    }
}

impl std::fmt::Debug for InMemoryContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryContentStore")
            .field("blob_count", &self.len())
            .field("read_only", &self.read_only.load(Ordering::SeqCst))
            .finish()
    }
}
