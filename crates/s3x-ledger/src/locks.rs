//! Keyed read/write lock registry, one lock per bucket name.
//!
//! Locks are created lazily on first use. A lock nobody holds or waits on
//! is pruned the next time a new bucket name is registered, so names of
//! buckets that no longer exist (or never did) do not accumulate. Guards
//! are owned, so they can be held across `.await` points and are released
//! when dropped on any exit path.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

/// Shared guard on a bucket. Released on drop.
#[derive(Debug)]
pub struct BucketReadGuard {
    bucket: String,
    _guard: OwnedRwLockReadGuard<()>,
}

impl BucketReadGuard {
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

/// Exclusive guard on a bucket. Released on drop.
#[derive(Debug)]
pub struct BucketWriteGuard {
    bucket: String,
    _guard: OwnedRwLockWriteGuard<()>,
}

impl BucketWriteGuard {
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

/// Registry of per-bucket read/write locks.
#[derive(Debug, Default)]
pub struct LockRegistry {
    locks: Mutex<HashMap<String, Arc<RwLock<()>>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, bucket: &str) -> Arc<RwLock<()>> {
        let mut locks = self.locks.lock().expect("lock registry poisoned");
        if let Some(lock) = locks.get(bucket) {
            return Arc::clone(lock);
        }
        // Guards and waiters hold their own clone; a count of one means idle.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        let lock = Arc::new(RwLock::new(()));
        locks.insert(bucket.to_string(), Arc::clone(&lock));
        lock
    }

    /// Acquire a shared lock on `bucket`.
    pub async fn read(&self, bucket: &str) -> BucketReadGuard {
        let guard = self.lock_for(bucket).read_owned().await;
        BucketReadGuard {
            bucket: bucket.to_string(),
            _guard: guard,
        }
    }

    /// Acquire an exclusive lock on `bucket`.
    pub async fn write(&self, bucket: &str) -> BucketWriteGuard {
        let guard = self.lock_for(bucket).write_owned().await;
        BucketWriteGuard {
            bucket: bucket.to_string(),
            _guard: guard,
        }
    }

    /// Try to take an exclusive lock without waiting.
    pub fn try_write(&self, bucket: &str) -> Option<BucketWriteGuard> {
        let guard = self.lock_for(bucket).try_write_owned().ok()?;
        Some(BucketWriteGuard {
            bucket: bucket.to_string(),
            _guard: guard,
        })
    }

    /// Number of bucket locks currently registered.
    pub fn len(&self) -> usize {
        self.locks.lock().expect("lock registry poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
