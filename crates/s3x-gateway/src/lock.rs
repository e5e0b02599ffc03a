//! Bucket locking for operations that span two buckets.
//!
//! Deadlock freedom rests on one rule: any two operations that lock the
//! same pair of buckets take them in the same global order. [`lock_order`]
//! defines that order (greater bucket name first) independently of which
//! bucket is the source and which the destination.

use std::cmp::Ordering;

use s3x_ledger::{BucketReadGuard, BucketWriteGuard, LockRegistry};

/// Acquisition plan for a two-bucket operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockOrder<'a> {
    /// Both sides name the same bucket: lock it once.
    Single(&'a str),
    /// Lock `first`, then `second`.
    Pair { first: &'a str, second: &'a str },
}

/// Order in which to lock `a` and `b`. Symmetric in its arguments.
pub fn lock_order<'a>(a: &'a str, b: &'a str) -> LockOrder<'a> {
    match a.cmp(b) {
        Ordering::Equal => LockOrder::Single(a),
        Ordering::Greater => LockOrder::Pair { first: a, second: b },
        Ordering::Less => LockOrder::Pair { first: b, second: a },
    }
}

/// Locks held for the duration of a copy. Released on drop.
#[derive(Debug)]
pub struct CopyLockGuard {
    _first: BucketWriteGuard,
    _second: Option<BucketWriteGuard>,
}

/// Scoped bucket locks on top of the ledger's lock registry.
#[derive(Clone, Copy, Debug)]
pub struct LockManager<'r> {
    registry: &'r LockRegistry,
}

impl<'r> LockManager<'r> {
    pub fn new(registry: &'r LockRegistry) -> Self {
        Self { registry }
    }

    pub async fn read_lock(&self, bucket: &str) -> BucketReadGuard {
        self.registry.read(bucket).await
    }

    pub async fn write_lock(&self, bucket: &str) -> BucketWriteGuard {
        self.registry.write(bucket).await
    }

    /// Lock the source and destination buckets of a copy.
    ///
    /// Both buckets are locked exclusively.
    pub async fn lock_for_copy(&self, src_bucket: &str, dst_bucket: &str) -> CopyLockGuard {
        match lock_order(src_bucket, dst_bucket) {
            LockOrder::Single(bucket) => CopyLockGuard {
                _first: self.registry.write(bucket).await,
                _second: None,
            },
            LockOrder::Pair { first, second } => {
                let first = self.registry.write(first).await;
                let second = self.registry.write(second).await;
                CopyLockGuard {
                    _first: first,
                    _second: Some(second),
                }
            }
        }
    }
}
