use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::hash::ContentHash;

/// User-defined metadata key that exposes the backing content address.
pub const CONTENT_HASH_HEADER: &str = "X-S3X-CONTENT-HASH";

/// Caller-facing description of a stored object.
///
/// `name` is unique within `bucket`. `mod_time` is `None` when the gateway
/// runs with deterministic timestamps.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub bucket: String,
    pub name: String,
    pub size: u64,
    pub mod_time: Option<DateTime<Utc>>,
    pub etag: String,
    pub content_type: String,
    pub content_encoding: String,
    pub content_disposition: String,
    pub content_language: String,
    /// Headers with no dedicated field, kept verbatim.
    pub user_defined: BTreeMap<String, String>,
}

impl ObjectInfo {
    /// Returns `true` if the object is a directory marker (`name` ends in `/`).
    pub fn is_dir(&self) -> bool {
        self.name.ends_with('/')
    }
}

/// Ledger record for an object: its content address plus metadata.
///
/// The ledger owns these records. The gateway asks the ledger to persist
/// them and treats whatever the ledger returns as authoritative.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerObject {
    pub data_hash: ContentHash,
    pub info: ObjectInfo,
}

impl LedgerObject {
    pub fn new(data_hash: ContentHash, info: ObjectInfo) -> Self {
        Self { data_hash, info }
    }

    /// Produce an independent record addressed at `bucket/name`.
    ///
    /// The source record is left untouched; the result shares no state with
    /// it. Fails if the source is malformed (null content hash or an empty
    /// name), since such a record cannot be safely duplicated.
    pub fn relocate(
        &self,
        bucket: &str,
        name: &str,
        mod_time: Option<DateTime<Utc>>,
    ) -> Result<Self, TypeError> {
        if self.data_hash.is_null() {
            return Err(TypeError::Malformed(format!(
                "{}/{} has a null content hash",
                self.info.bucket, self.info.name
            )));
        }
        if self.info.name.is_empty() {
            return Err(TypeError::Malformed(format!(
                "record in bucket {} has an empty name",
                self.info.bucket
            )));
        }
        let mut copy = self.clone();
        copy.info.bucket = bucket.to_string();
        copy.info.name = name.to_string();
        copy.info.mod_time = mod_time;
        Ok(copy)
    }
}

/// Per-request options supplied by the caller.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectOptions {
    /// Request headers and `x-amz-meta-*` style metadata.
    pub user_defined: BTreeMap<String, String>,
}

impl ObjectOptions {
    /// Options carrying a single header.
    pub fn with_header(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut user_defined = BTreeMap::new();
        user_defined.insert(key.into(), value.into());
        Self { user_defined }
    }
}
