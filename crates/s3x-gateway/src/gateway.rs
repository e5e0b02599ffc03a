//! Bucket/object operations composed over the ledger and the content store.

use std::collections::HashMap;
use std::sync::Arc;

use s3x_ledger::LedgerStore;
use s3x_store::ContentStore;
use s3x_types::{ContentHash, LedgerObject, ObjectInfo, ObjectOptions};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tracing::{debug, info, warn};

use crate::config::GatewayConfig;
use crate::error::{translate, GatewayError, GatewayResult};
use crate::listing::{
    common_prefix, group_by_delimiter, ListObjectsInfo, ListObjectsV2Info, ListObjectsV2Params,
};
use crate::lock::LockManager;
use crate::metadata::MetadataMapper;
use crate::pipeline::{self, GetObjectReader};
use crate::range::{self, HttpRange};

/// Name appended to a directory marker to hold its placeholder payload.
pub const PLACEHOLDER_FILE_NAME: &str = ".keep";

/// Bytes stored for a directory marker in place of an empty blob.
pub const PLACEHOLDER_PAYLOAD: &[u8] = b"KEEP FILE";

/// Upload body: a byte stream plus the length the caller declared for it.
pub struct PutObjReader {
    reader: Box<dyn AsyncRead + Unpin + Send>,
    size: u64,
}

impl PutObjReader {
    pub fn new(reader: impl AsyncRead + Unpin + Send + 'static, size: u64) -> Self {
        Self {
            reader: Box::new(reader),
            size,
        }
    }

    /// Body backed by an in-memory buffer.
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        let data = data.into();
        let size = data.len() as u64;
        Self::new(std::io::Cursor::new(data), size)
    }

    /// Declared length of the body.
    pub fn size(&self) -> u64 {
        self.size
    }
}

impl std::fmt::Debug for PutObjReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PutObjReader")
            .field("size", &self.size)
            .finish()
    }
}

/// S3-style gateway over a metadata ledger and a content-addressed store.
///
/// Cheap to clone; clones share both collaborators.
#[derive(Clone)]
pub struct S3xGateway {
    ledger: Arc<dyn LedgerStore>,
    content: Arc<dyn ContentStore>,
    mapper: MetadataMapper,
    config: GatewayConfig,
}

impl S3xGateway {
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        content: Arc<dyn ContentStore>,
        config: GatewayConfig,
    ) -> Self {
        Self {
            ledger,
            content,
            mapper: MetadataMapper::new(config.deterministic_timestamps),
            config,
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn locks(&self) -> LockManager<'_> {
        LockManager::new(self.ledger.locks())
    }

    // -----------------------------------------------------------------------
    // Listing
    // -----------------------------------------------------------------------

    /// List every object in `bucket` under `prefix`.
    ///
    /// `marker`, `delimiter` and `max_keys` are accepted for API parity but
    /// not applied: the result is always the full flat listing.
    pub async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        _marker: &str,
        _delimiter: &str,
        _max_keys: usize,
    ) -> GatewayResult<ListObjectsInfo> {
        let objects = self
            .ledger
            .object_infos(bucket, prefix, "", 0)
            .await
            .map_err(|e| translate(e, bucket, "", ""))?;
        debug!(bucket, prefix, count = objects.len(), "list objects");
        Ok(ListObjectsInfo {
            objects,
            ..Default::default()
        })
    }

    /// List up to one page of entries after `start_after` (or the
    /// continuation token), grouping by `delimiter` when one is given.
    ///
    /// A page holds at most `max_keys` entries, a common prefix counting as
    /// one entry however many keys it folds. When a page ends on a common
    /// prefix the continuation token is that prefix, and the next page
    /// resumes past every key under it.
    pub async fn list_objects_v2(
        &self,
        bucket: &str,
        params: &ListObjectsV2Params,
    ) -> GatewayResult<ListObjectsV2Info> {
        let limit = match params.max_keys {
            0 => self.config.list_page_limit,
            n => n.min(self.config.list_page_limit),
        }
        .max(1);
        let prefix = params.prefix.as_str();
        let delimiter = params.delimiter.as_str();

        let (mut cursor, skip) = if params.continuation_token.is_empty() {
            (params.start_after.clone(), None)
        } else {
            let token = params.continuation_token.clone();
            let skip = common_prefix(&token, prefix, delimiter).filter(|p| *p == token);
            (token, skip)
        };

        // Keys sharing a common prefix are contiguous in name order, so only
        // the first key of each prefix is kept.
        let mut entries: Vec<ObjectInfo> = Vec::new();
        let mut current_prefix: Option<String> = None;
        let mut is_truncated = false;
        'fetch: loop {
            let batch = self
                .ledger
                .object_infos(bucket, prefix, &cursor, limit.saturating_add(1))
                .await
                .map_err(|e| translate(e, bucket, "", ""))?;
            let exhausted = batch.len() <= limit;
            for obj in batch {
                cursor.clone_from(&obj.name);
                if skip.as_deref().is_some_and(|p| obj.name.starts_with(p)) {
                    continue;
                }
                let folded = common_prefix(&obj.name, prefix, delimiter);
                if folded.is_some() && folded == current_prefix {
                    continue;
                }
                if entries.len() == limit {
                    is_truncated = true;
                    break 'fetch;
                }
                current_prefix = folded;
                entries.push(obj);
            }
            if exhausted {
                break;
            }
        }

        let next_continuation_token = if is_truncated {
            entries.last().map(|o| {
                common_prefix(&o.name, prefix, delimiter).unwrap_or_else(|| o.name.clone())
            })
        } else {
            None
        };
        debug!(bucket, prefix, count = entries.len(), is_truncated, "list objects v2");

        let (objects, prefixes) = group_by_delimiter(entries, prefix, delimiter);
        Ok(ListObjectsV2Info {
            is_truncated,
            continuation_token: params.continuation_token.clone(),
            next_continuation_token,
            objects,
            prefixes,
        })
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Metadata of `bucket/object`.
    pub async fn get_object_info(&self, bucket: &str, object: &str) -> GatewayResult<ObjectInfo> {
        let record = self
            .ledger
            .object(bucket, object)
            .await
            .map_err(|e| translate(e, bucket, object, ""))?;
        Ok(MetadataMapper::to_object_info(&record))
    }

    /// Write `length` bytes of `bucket/object`, starting at `offset`, to
    /// `writer`.
    pub async fn get_object(
        &self,
        bucket: &str,
        object: &str,
        offset: u64,
        length: u64,
        writer: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> GatewayResult<()> {
        let (hash, size) = self
            .ledger
            .object_data_hash(bucket, object)
            .await
            .map_err(|e| translate(e, bucket, object, ""))?;
        pipeline::check_range(offset, length, size)?;
        pipeline::download(self.content.as_ref(), writer, &hash, offset, length)
            .await
            .map_err(|e| translate(e, bucket, object, ""))?;
        Ok(())
    }

    /// Metadata of `bucket/object` plus a stream of the bytes selected by
    /// `range` (the whole object when `None`).
    pub async fn get_object_n_info(
        &self,
        bucket: &str,
        object: &str,
        range: Option<&HttpRange>,
    ) -> GatewayResult<GetObjectReader> {
        let info = self.get_object_info(bucket, object).await?;
        let (offset, length) = range::resolve(range, info.size)?;

        let gateway = self.clone();
        let (bucket, object) = (bucket.to_string(), object.to_string());
        Ok(GetObjectReader::spawn(
            info,
            self.config.pipe_buffer_size,
            move |mut writer| async move {
                gateway
                    .get_object(&bucket, &object, offset, length, &mut writer)
                    .await
            },
        ))
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Store `data` as `bucket/object`.
    ///
    /// A zero-byte body is only accepted for directory markers (names ending
    /// in `/`); those are stored as a placeholder object under
    /// `object + ".keep"`.
    pub async fn put_object(
        &self,
        bucket: &str,
        object: &str,
        data: PutObjReader,
        opts: &ObjectOptions,
    ) -> GatewayResult<ObjectInfo> {
        self.ledger
            .assert_bucket_exists(bucket)
            .await
            .map_err(|e| translate(e, bucket, "", ""))?;

        if data.size() == 0 {
            if !object.ends_with('/') {
                return Err(GatewayError::ObjectSizeZero {
                    bucket: bucket.to_string(),
                    object: object.to_string(),
                });
            }
            return self.put_folder_marker(bucket, object, opts).await;
        }

        let expected = data.size();
        let mut body = data.reader.take(expected);
        let (hash, size) = pipeline::upload(self.content.as_ref(), &mut body)
            .await
            .map_err(|e| translate(e, bucket, object, ""))?;
        if size < expected {
            warn!(bucket, object, hash = %hash, expected, size, "short body; uploaded blob is orphaned");
            return Err(GatewayError::IncompleteBody {
                bucket: bucket.to_string(),
                object: object.to_string(),
                expected,
                actual: size,
            });
        }
        self.record_object(bucket, object, hash, size, opts).await
    }

    async fn put_folder_marker(
        &self,
        bucket: &str,
        object: &str,
        opts: &ObjectOptions,
    ) -> GatewayResult<ObjectInfo> {
        let name = format!("{object}{PLACEHOLDER_FILE_NAME}");
        let mut payload = PLACEHOLDER_PAYLOAD;
        let (hash, size) = pipeline::upload(self.content.as_ref(), &mut payload)
            .await
            .map_err(|e| {
                warn!(bucket, object, error = %e, "placeholder upload failed");
                GatewayError::FolderCreationFailed {
                    bucket: bucket.to_string(),
                    object: object.to_string(),
                }
            })?;
        self.record_object(bucket, &name, hash, size, opts).await
    }

    async fn record_object(
        &self,
        bucket: &str,
        object: &str,
        hash: ContentHash,
        size: u64,
        opts: &ObjectOptions,
    ) -> GatewayResult<ObjectInfo> {
        let info = self.mapper.new_object_info(bucket, object, size, &hash, opts);
        let record = LedgerObject::new(hash, info);
        if let Err(e) = self.ledger.put_object(bucket, object, &record).await {
            warn!(bucket, object, hash = %hash, error = %e, "ledger write failed; uploaded blob is orphaned");
            return Err(translate(e, bucket, object, ""));
        }
        info!(bucket, object, hash = %hash, size, "object stored");
        Ok(MetadataMapper::to_object_info(&record))
    }

    /// Copy `src_bucket/src_object` to `dst_bucket/dst_object`.
    ///
    /// Only the ledger record is duplicated; both objects reference the same
    /// blob. The source record is never modified.
    pub async fn copy_object(
        &self,
        src_bucket: &str,
        src_object: &str,
        dst_bucket: &str,
        dst_object: &str,
    ) -> GatewayResult<ObjectInfo> {
        let _locks = self.locks().lock_for_copy(src_bucket, dst_bucket).await;

        self.ledger
            .assert_bucket_exists(dst_bucket)
            .await
            .map_err(|e| translate(e, dst_bucket, "", ""))?;
        let source = self
            .ledger
            .object(src_bucket, src_object)
            .await
            .map_err(|e| translate(e, src_bucket, src_object, ""))?;
        let copy = source
            .relocate(dst_bucket, dst_object, self.mapper.now())
            .map_err(|e| translate(e, src_bucket, src_object, ""))?;
        self.ledger
            .put_object(dst_bucket, dst_object, &copy)
            .await
            .map_err(|e| translate(e, dst_bucket, dst_object, ""))?;

        info!(src_bucket, src_object, dst_bucket, dst_object, "object copied");
        Ok(MetadataMapper::to_object_info(&copy))
    }

    // -----------------------------------------------------------------------
    // Deletes
    // -----------------------------------------------------------------------

    /// Remove `bucket/object` from the ledger.
    pub async fn delete_object(&self, bucket: &str, object: &str) -> GatewayResult<()> {
        self.ledger
            .remove_object(bucket, object)
            .await
            .map_err(|e| translate(e, bucket, object, ""))
    }

    /// Remove a batch of objects.
    ///
    /// The result has one slot per input name, in input order: `None` when
    /// the record was removed, `ObjectNotFound` when the ledger had none.
    /// Blobs are left for an external garbage collector.
    pub async fn delete_objects(
        &self,
        bucket: &str,
        objects: &[String],
    ) -> GatewayResult<Vec<Option<GatewayError>>> {
        let missing = self
            .ledger
            .remove_objects(bucket, objects)
            .await
            .map_err(|e| translate(e, bucket, "", ""))?;

        // A name given twice is removed by its first occurrence, so later
        // occurrences are the ones reported missing.
        let mut removed: HashMap<&str, usize> = HashMap::new();
        for name in objects {
            *removed.entry(name.as_str()).or_default() += 1;
        }
        for name in &missing {
            if let Some(count) = removed.get_mut(name.as_str()) {
                *count = count.saturating_sub(1);
            }
        }
        Ok(objects
            .iter()
            .map(|name| match removed.get_mut(name.as_str()) {
                Some(count) if *count > 0 => {
                    *count -= 1;
                    None
                }
                _ => Some(GatewayError::ObjectNotFound {
                    bucket: bucket.to_string(),
                    object: name.clone(),
                    version: String::new(),
                }),
            })
            .collect())
    }
}

impl std::fmt::Debug for S3xGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3xGateway")
            .field("config", &self.config)
            .finish()
    }
}
