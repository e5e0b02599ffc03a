use async_trait::async_trait;
use s3x_types::{ContentHash, LedgerObject, ObjectInfo};

use crate::error::LedgerResult;
use crate::locks::LockRegistry;

/// Metadata system of record mapping `(bucket, object)` to object records.
///
/// The ledger is authoritative for bucket existence, object sizes and the
/// content addresses that back each object. Implementations handle their
/// own internal concurrency; puts to the same key are last-write-wins.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// List objects in `bucket` whose names start with `prefix` and sort
    /// strictly after `start_after`, ordered by name.
    ///
    /// `limit == 0` means no limit.
    async fn object_infos(
        &self,
        bucket: &str,
        prefix: &str,
        start_after: &str,
        limit: usize,
    ) -> LedgerResult<Vec<ObjectInfo>>;

    /// Content address and stored size of an object.
    async fn object_data_hash(&self, bucket: &str, object: &str)
        -> LedgerResult<(ContentHash, u64)>;

    /// Full ledger record of an object.
    async fn object(&self, bucket: &str, object: &str) -> LedgerResult<LedgerObject>;

    /// Fails with `BucketNotFound` if `bucket` does not exist.
    async fn assert_bucket_exists(&self, bucket: &str) -> LedgerResult<()>;

    /// Create or replace the record for `bucket/object`.
    async fn put_object(
        &self,
        bucket: &str,
        object: &str,
        record: &LedgerObject,
    ) -> LedgerResult<()>;

    /// Remove one record. Fails with `ObjectNotFound` if absent.
    async fn remove_object(&self, bucket: &str, object: &str) -> LedgerResult<()>;

    /// Remove a batch of records. Returns the names that were not present.
    async fn remove_objects(&self, bucket: &str, objects: &[String])
        -> LedgerResult<Vec<String>>;

    /// The per-bucket lock registry shared by every user of this ledger.
    fn locks(&self) -> &LockRegistry;
}
