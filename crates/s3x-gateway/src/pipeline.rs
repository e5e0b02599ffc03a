//! Streaming transfers between callers and the content store.
//!
//! Uploads hand the caller's stream straight to the store. Downloads are
//! range-checked against the size the ledger recorded before the store is
//! touched, and [`GetObjectReader`] decouples a background download from
//! the caller through a bounded in-memory pipe.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use s3x_store::{ContentStore, StoreResult};
use s3x_types::{ContentHash, ObjectInfo};
use tokio::io::{AsyncRead, AsyncWrite, DuplexStream, ReadBuf};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::{GatewayError, GatewayResult};

/// Fail with [`GatewayError::InvalidRange`] unless
/// `offset + length <= stored`.
pub fn check_range(offset: u64, length: u64, stored: u64) -> GatewayResult<()> {
    match offset.checked_add(length) {
        Some(end) if end <= stored => Ok(()),
        end => Err(GatewayError::InvalidRange {
            offset_begin: offset,
            offset_end: end.unwrap_or(u64::MAX),
            resource_size: stored,
        }),
    }
}

/// Stream `reader` into the content store.
pub async fn upload(
    store: &dyn ContentStore,
    reader: &mut (dyn AsyncRead + Unpin + Send),
) -> StoreResult<(ContentHash, u64)> {
    let (hash, size) = store.upload(reader).await?;
    tracing::debug!(hash = %hash.short_hex(), size, "upload accepted");
    Ok((hash, size))
}

/// Stream `length` bytes of `hash` from `offset` into `writer`.
pub async fn download(
    store: &dyn ContentStore,
    writer: &mut (dyn AsyncWrite + Unpin + Send),
    hash: &ContentHash,
    offset: u64,
    length: u64,
) -> StoreResult<u64> {
    tracing::debug!(hash = %hash.short_hex(), offset, length, "range download");
    store.download(writer, hash, offset, length).await
}

/// Object metadata plus a stream of the requested bytes.
///
/// The bytes are produced by a background task writing into one end of a
/// pipe; this reader owns the other end. A failure in the task surfaces as
/// an I/O error once the bytes it did deliver have been read. Dropping the
/// reader closes the pipe and aborts the task, so an abandoned read stops
/// fetching from the store.
pub struct GetObjectReader {
    info: ObjectInfo,
    pipe: DuplexStream,
    outcome: oneshot::Receiver<GatewayResult<()>>,
    task: JoinHandle<()>,
    done: bool,
}

impl GetObjectReader {
    /// Spawn `producer` with the write end of a pipe of `buffer_size` bytes
    /// and return a reader over the read end.
    pub fn spawn<F, Fut>(info: ObjectInfo, buffer_size: usize, producer: F) -> Self
    where
        F: FnOnce(DuplexStream) -> Fut,
        Fut: Future<Output = GatewayResult<()>> + Send + 'static,
    {
        let (pipe, writer) = tokio::io::duplex(buffer_size.max(1));
        let (tx, outcome) = oneshot::channel();
        let produce = producer(writer);
        let task = tokio::spawn(async move {
            let result = produce.await;
            if let Err(err) = &result {
                tracing::debug!(error = %err, "object download ended early");
            }
            let _ = tx.send(result);
        });
        Self {
            info,
            pipe,
            outcome,
            task,
            done: false,
        }
    }

    /// Metadata of the object being read.
    pub fn info(&self) -> &ObjectInfo {
        &self.info
    }
}

impl AsyncRead for GetObjectReader {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(Ok(()));
        }
        let before = buf.filled().len();
        ready!(Pin::new(&mut this.pipe).poll_read(cx, buf))?;
        if buf.filled().len() > before || buf.remaining() == 0 {
            return Poll::Ready(Ok(()));
        }

        // The producer dropped its end: report how it finished.
        let outcome = ready!(Pin::new(&mut this.outcome).poll(cx));
        this.done = true;
        match outcome {
            Ok(Ok(())) => Poll::Ready(Ok(())),
            Ok(Err(err)) => Poll::Ready(Err(io::Error::other(err))),
            Err(_) => Poll::Ready(Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "object download task ended without a result",
            ))),
        }
    }
}

impl Drop for GetObjectReader {
    fn drop(&mut self) {
        if !self.task.is_finished() {
            tracing::warn!(
                bucket = %self.info.bucket,
                object = %self.info.name,
                "reader dropped before download finished; cancelling"
            );
            self.task.abort();
        }
    }
}

impl std::fmt::Debug for GetObjectReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GetObjectReader")
            .field("bucket", &self.info.bucket)
            .field("object", &self.info.name)
            .field("done", &self.done)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use s3x_store::InMemoryContentStore;
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    proptest! {
        #[test]
        fn range_within_size_is_accepted(size in 0u64..1 << 40, a in 0u64..1 << 40, b in 0u64..1 << 40) {
            let offset = a.min(size);
            let length = b.min(size - offset);
            prop_assert!(check_range(offset, length, size).is_ok());
        }

        #[test]
        fn range_past_size_reports_exact_bounds(size in 0u64..1 << 40, offset in 0u64..1 << 41, length in 0u64..1 << 41) {
            prop_assume!(offset + length > size);
            match check_range(offset, length, size) {
                Err(GatewayError::InvalidRange { offset_begin, offset_end, resource_size }) => {
                    prop_assert_eq!(offset_begin, offset);
                    prop_assert_eq!(offset_end, offset + length);
                    prop_assert_eq!(resource_size, size);
                }
                other => prop_assert!(false, "expected InvalidRange, got {:?}", other),
            }
        }
    }

    #[test]
    fn overflowing_range_is_invalid() {
        assert!(matches!(
            check_range(u64::MAX, 2, 10),
            Err(GatewayError::InvalidRange {
                offset_end: u64::MAX,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn upload_then_download_range() {
        let store = InMemoryContentStore::new();
        let mut body: &[u8] = b"abcdefghij";
        let (hash, size) = upload(&store, &mut body).await.unwrap();
        assert_eq!(size, 10);
        let mut out = Vec::new();
        let n = download(&store, &mut out, &hash, 2, 3).await.unwrap();
        assert_eq!(n, 3);
        assert_eq!(out, b"cde");
    }

    #[tokio::test]
    async fn reader_streams_producer_output() {
        let mut reader = GetObjectReader::spawn(ObjectInfo::default(), 4, |mut w| async move {
            w.write_all(b"hello pipe").await.map_err(|e| {
                crate::error::translate(e, "b", "k", "")
            })?;
            Ok(())
        });
        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"hello pipe");
    }

    #[tokio::test]
    async fn producer_failure_surfaces_after_delivered_bytes() {
        let mut reader = GetObjectReader::spawn(ObjectInfo::default(), 64, |mut w| async move {
            let _ = w.write_all(b"partial").await;
            Err(GatewayError::InvalidRange {
                offset_begin: 0,
                offset_end: 10,
                resource_size: 5,
            })
        });
        let mut out = Vec::new();
        let err = reader.read_to_end(&mut out).await.unwrap_err();
        assert_eq!(out, b"partial");
        assert_eq!(err.kind(), io::ErrorKind::Other);
        let inner = err.get_ref().unwrap().downcast_ref::<GatewayError>().unwrap();
        assert!(matches!(inner, GatewayError::InvalidRange { .. }));
    }

    #[tokio::test]
    async fn dropping_reader_stops_the_download() {
        let store = Arc::new(InMemoryContentStore::new());
        let data = vec![1u8; 4 * 1024 * 1024];
        let mut body: &[u8] = &data;
        let (hash, size) = upload(store.as_ref(), &mut body).await.unwrap();

        let producer_store = Arc::clone(&store);
        let mut reader = GetObjectReader::spawn(ObjectInfo::default(), 1024, move |mut w| async move {
            download(producer_store.as_ref(), &mut w, &hash, 0, size)
                .await
                .map_err(|e| crate::error::translate(e, "b", "k", ""))?;
            Ok(())
        });
        let mut head = [0u8; 16];
        reader.read_exact(&mut head).await.unwrap();
        drop(reader);

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        let served = store.bytes_served();
        assert!(served < size, "served {served} of {size} bytes after cancel");
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(store.bytes_served(), served);
    }
}
