use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use s3x_types::{ContentHash, LedgerObject, ObjectInfo};

use crate::error::{LedgerError, LedgerResult};
use crate::locks::LockRegistry;
use crate::traits::LedgerStore;

/// In-memory ledger for tests, local demos, and embedding.
///
/// Buckets and their objects live in ordered maps so listings come out
/// sorted by name without an extra pass.
pub struct InMemoryLedger {
    inner: RwLock<LedgerState>,
    locks: LockRegistry,
    read_only: AtomicBool,
}

#[derive(Default)]
struct LedgerState {
    buckets: BTreeMap<String, BTreeMap<String, LedgerObject>>,
}

impl LedgerState {
    fn bucket(&self, bucket: &str) -> LedgerResult<&BTreeMap<String, LedgerObject>> {
        self.buckets
            .get(bucket)
            .ok_or_else(|| LedgerError::BucketNotFound(bucket.to_string()))
    }

    fn bucket_mut(
        &mut self,
        bucket: &str,
    ) -> LedgerResult<&mut BTreeMap<String, LedgerObject>> {
        self.buckets
            .get_mut(bucket)
            .ok_or_else(|| LedgerError::BucketNotFound(bucket.to_string()))
    }
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(LedgerState::default()),
            locks: LockRegistry::new(),
            read_only: AtomicBool::new(false),
        }
    }

    fn state(&self) -> LedgerResult<RwLockReadGuard<'_, LedgerState>> {
        self.inner.read().map_err(|_| LedgerError::Poisoned)
    }

    fn state_mut(&self) -> LedgerResult<RwLockWriteGuard<'_, LedgerState>> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(LedgerError::ReadOnly);
        }
        self.inner.write().map_err(|_| LedgerError::Poisoned)
    }

    /// Create an empty bucket.
    pub fn make_bucket(&self, bucket: &str) -> LedgerResult<()> {
        let mut state = self.state_mut()?;
        if state.buckets.contains_key(bucket) {
            return Err(LedgerError::BucketExists(bucket.to_string()));
        }
        state.buckets.insert(bucket.to_string(), BTreeMap::new());
        tracing::debug!(bucket, "bucket created");
        Ok(())
    }

    /// Remove an empty bucket.
    pub fn remove_bucket(&self, bucket: &str) -> LedgerResult<()> {
        let mut state = self.state_mut()?;
        if !state.bucket(bucket)?.is_empty() {
            return Err(LedgerError::BucketNotEmpty(bucket.to_string()));
        }
        state.buckets.remove(bucket);
        Ok(())
    }

    /// Sorted list of bucket names.
    pub fn buckets(&self) -> LedgerResult<Vec<String>> {
        Ok(self.state()?.buckets.keys().cloned().collect())
    }

    /// Number of objects recorded in `bucket`.
    pub fn object_count(&self, bucket: &str) -> LedgerResult<usize> {
        Ok(self.state()?.bucket(bucket)?.len())
    }

    /// Make every subsequent mutation fail with [`LedgerError::ReadOnly`].
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
    async fn object_infos(
        &self,
        bucket: &str,
        prefix: &str,
        start_after: &str,
        limit: usize,
    ) -> LedgerResult<Vec<ObjectInfo>> {
        let state = self.state()?;
        let objects = state.bucket(bucket)?;
        let lower = if start_after.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Excluded(start_after)
        };
        let limit = if limit == 0 { usize::MAX } else { limit };
        Ok(objects
            .range::<str, _>((lower, Bound::Unbounded))
            .filter(|(name, _)| name.starts_with(prefix))
            .take(limit)
            .map(|(_, record)| record.info.clone())
            .collect())
    }

    async fn object_data_hash(
        &self,
        bucket: &str,
        object: &str,
    ) -> LedgerResult<(ContentHash, u64)> {
        let record = self.object(bucket, object).await?;
        Ok((record.data_hash, record.info.size))
    }

    async fn object(&self, bucket: &str, object: &str) -> LedgerResult<LedgerObject> {
        let state = self.state()?;
        state
            .bucket(bucket)?
            .get(object)
            .cloned()
            .ok_or_else(|| LedgerError::ObjectNotFound {
                bucket: bucket.to_string(),
                object: object.to_string(),
            })
    }

    async fn assert_bucket_exists(&self, bucket: &str) -> LedgerResult<()> {
        self.state()?.bucket(bucket).map(|_| ())
    }

    async fn put_object(
        &self,
        bucket: &str,
        object: &str,
        record: &LedgerObject,
    ) -> LedgerResult<()> {
        let mut state = self.state_mut()?;
        state
            .bucket_mut(bucket)?
            .insert(object.to_string(), record.clone());
        Ok(())
    }

    async fn remove_object(&self, bucket: &str, object: &str) -> LedgerResult<()> {
        let mut state = self.state_mut()?;
        match state.bucket_mut(bucket)?.remove(object) {
            Some(_) => Ok(()),
            None => Err(LedgerError::ObjectNotFound {
                bucket: bucket.to_string(),
                object: object.to_string(),
            }),
        }
    }

    async fn remove_objects(
        &self,
        bucket: &str,
        objects: &[String],
    ) -> LedgerResult<Vec<String>> {
        let mut state = self.state_mut()?;
        let records = state.bucket_mut(bucket)?;
        let missing = objects
            .iter()
            .filter(|name| records.remove(name.as_str()).is_none())
            .cloned()
            .collect();
        Ok(missing)
    }

    fn locks(&self) -> &LockRegistry {
        &self.locks
    }
}

impl std::fmt::Debug for InMemoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let buckets = self.buckets().map(|b| b.len()).unwrap_or_default();
        f.debug_struct("InMemoryLedger")
            .field("bucket_count", &buckets)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(bucket: &str, name: &str, data: &[u8]) -> LedgerObject {
        LedgerObject::new(
            ContentHash::from_bytes(data),
            ObjectInfo {
                bucket: bucket.into(),
                name: name.into(),
                size: data.len() as u64,
                mod_time: Some(chrono::Utc::now()),
                ..Default::default()
            },
        )
    }

    async fn seeded(names: &[&str]) -> InMemoryLedger {
        let ledger = InMemoryLedger::new();
        ledger.make_bucket("b").unwrap();
        for name in names {
            ledger
                .put_object("b", name, &record("b", name, name.as_bytes()))
                .await
                .unwrap();
        }
        ledger
    }

    fn names(infos: &[ObjectInfo]) -> Vec<&str> {
        infos.iter().map(|i| i.name.as_str()).collect()
    }

    // -----------------------------------------------------------------------
    // Buckets
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn bucket_lifecycle() {
        let ledger = InMemoryLedger::new();
        assert!(matches!(
            ledger.assert_bucket_exists("b").await,
            Err(LedgerError::BucketNotFound(_))
        ));
        ledger.make_bucket("b").unwrap();
        ledger.assert_bucket_exists("b").await.unwrap();
        assert_eq!(
            ledger.make_bucket("b"),
            Err(LedgerError::BucketExists("b".into()))
        );
        ledger.remove_bucket("b").unwrap();
        assert!(ledger.buckets().unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_empty_bucket_cannot_be_removed() {
        let ledger = seeded(&["x"]).await;
        assert_eq!(
            ledger.remove_bucket("b"),
            Err(LedgerError::BucketNotEmpty("b".into()))
        );
    }

    // -----------------------------------------------------------------------
    // Listing
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn listing_is_sorted_and_prefix_filtered() {
        let ledger = seeded(&["b/2", "a/1", "b/1", "c"]).await;
        let all = ledger.object_infos("b", "", "", 0).await.unwrap();
        assert_eq!(names(&all), ["a/1", "b/1", "b/2", "c"]);
        let under_b = ledger.object_infos("b", "b/", "", 0).await.unwrap();
        assert_eq!(names(&under_b), ["b/1", "b/2"]);
    }

    #[tokio::test]
    async fn listing_honours_start_after_and_limit() {
        let ledger = seeded(&["a", "b", "c", "d"]).await;
        let page = ledger.object_infos("b", "", "a", 2).await.unwrap();
        assert_eq!(names(&page), ["b", "c"]);
        let rest = ledger.object_infos("b", "", "c", 2).await.unwrap();
        assert_eq!(names(&rest), ["d"]);
    }

    #[tokio::test]
    async fn listing_missing_bucket() {
        let ledger = InMemoryLedger::new();
        assert!(matches!(
            ledger.object_infos("nope", "", "", 0).await,
            Err(LedgerError::BucketNotFound(_))
        ));
    }

    // -----------------------------------------------------------------------
    // Records
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn put_then_read_record() {
        let ledger = seeded(&[]).await;
        let rec = record("b", "k", b"payload");
        ledger.put_object("b", "k", &rec).await.unwrap();
        assert_eq!(ledger.object("b", "k").await.unwrap(), rec);
        let (hash, size) = ledger.object_data_hash("b", "k").await.unwrap();
        assert_eq!(hash, ContentHash::from_bytes(b"payload"));
        assert_eq!(size, 7);
    }

    #[tokio::test]
    async fn put_into_missing_bucket() {
        let ledger = InMemoryLedger::new();
        let err = ledger
            .put_object("nope", "k", &record("nope", "k", b"x"))
            .await
            .unwrap_err();
        assert_eq!(err, LedgerError::BucketNotFound("nope".into()));
    }

    #[tokio::test]
    async fn missing_record() {
        let ledger = seeded(&[]).await;
        assert_eq!(
            ledger.object("b", "k").await.unwrap_err(),
            LedgerError::ObjectNotFound {
                bucket: "b".into(),
                object: "k".into()
            }
        );
    }

    #[tokio::test]
    async fn remove_single() {
        let ledger = seeded(&["k"]).await;
        ledger.remove_object("b", "k").await.unwrap();
        assert!(matches!(
            ledger.remove_object("b", "k").await,
            Err(LedgerError::ObjectNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn remove_batch_reports_missing() {
        let ledger = seeded(&["a", "c"]).await;
        let missing = ledger
            .remove_objects("b", &["a".into(), "b".into(), "c".into(), "d".into()])
            .await
            .unwrap();
        assert_eq!(missing, ["b", "d"]);
        assert_eq!(ledger.object_count("b").unwrap(), 0);
    }

    #[tokio::test]
    async fn read_only_rejects_mutations_but_serves_reads() {
        let ledger = seeded(&["k"]).await;
        ledger.set_read_only(true);
        assert_eq!(
            ledger
                .put_object("b", "x", &record("b", "x", b"x"))
                .await
                .unwrap_err(),
            LedgerError::ReadOnly
        );
        assert_eq!(
            ledger.remove_object("b", "k").await.unwrap_err(),
            LedgerError::ReadOnly
        );
        assert!(ledger.object("b", "k").await.is_ok());
    }
}
