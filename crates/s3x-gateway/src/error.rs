//! Caller-facing error taxonomy and the translator that maps collaborator
//! failures into it.
//!
//! Every public gateway operation returns [`GatewayError`]. Raw ledger,
//! content store or KV errors never cross that boundary unwrapped: they are
//! passed through [`translate`] together with the bucket/object/version the
//! operation was working on.

use s3x_kv::KvError;
use s3x_ledger::LedgerError;
use s3x_store::StoreError;
use s3x_types::TypeError;

/// Failures raised by the collaborators the gateway orchestrates.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("ledger: {0}")]
    Ledger(#[from] LedgerError),

    #[error("content store: {0}")]
    Store(#[from] StoreError),

    #[error("kv: {0}")]
    Kv(#[from] KvError),

    #[error("record: {0}")]
    Type(#[from] TypeError),

    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors returned by gateway operations.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("object not found: {bucket}/{object}")]
    ObjectNotFound {
        bucket: String,
        object: String,
        version: String,
    },

    #[error("bucket does not exist: {bucket}")]
    BucketNotFound { bucket: String },

    #[error("zero-byte object {bucket}/{object} must end with '/'")]
    ObjectSizeZero { bucket: String, object: String },

    #[error("requested range {offset_begin}-{offset_end} exceeds resource size {resource_size}")]
    InvalidRange {
        offset_begin: u64,
        offset_end: u64,
        resource_size: u64,
    },

    #[error("invalid range header: {0}")]
    InvalidRangeSpec(String),

    #[error("could not create folder placeholder for {bucket}/{object}")]
    FolderCreationFailed { bucket: String, object: String },

    #[error("value too long: {size} bytes exceeds the {max} byte limit")]
    ValueTooLarge { size: usize, max: usize },

    #[error("incomplete body for {bucket}/{object}: expected {expected} bytes, got {actual}")]
    IncompleteBody {
        bucket: String,
        object: String,
        expected: u64,
        actual: u64,
    },

    #[error("internal invariant violated on {bucket}/{object}: {reason}")]
    Invariant {
        bucket: String,
        object: String,
        reason: String,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("backend failure on {bucket}/{object}: {source}")]
    Backend {
        bucket: String,
        object: String,
        version: String,
        #[source]
        source: BackendError,
    },
}

impl GatewayError {
    /// Returns `true` for errors meaning "no such object".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ObjectNotFound { .. })
    }
}

/// Result alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Map a collaborator error into the caller-facing taxonomy, annotated with
/// the bucket, object and version the failing operation targeted.
pub fn translate(
    err: impl Into<BackendError>,
    bucket: &str,
    object: &str,
    version: &str,
) -> GatewayError {
    match err.into() {
        BackendError::Ledger(LedgerError::BucketNotFound(missing)) => {
            GatewayError::BucketNotFound { bucket: missing }
        }
        BackendError::Ledger(LedgerError::ObjectNotFound { .. })
        | BackendError::Kv(KvError::NotFound(_)) => GatewayError::ObjectNotFound {
            bucket: bucket.to_string(),
            object: object.to_string(),
            version: version.to_string(),
        },
        BackendError::Kv(KvError::ValueTooLarge { size, max }) => {
            GatewayError::ValueTooLarge { size, max }
        }
        BackendError::Type(err) => GatewayError::Invariant {
            bucket: bucket.to_string(),
            object: object.to_string(),
            reason: err.to_string(),
        },
        source => GatewayError::Backend {
            bucket: bucket.to_string(),
            object: object.to_string(),
            version: version.to_string(),
            source,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use s3x_kv::{InMemoryKvStore, KvConfig, KvStore};
    use s3x_types::ContentHash;

    #[test]
    fn missing_bucket() {
        let err = translate(LedgerError::BucketNotFound("photos".into()), "photos", "", "");
        assert!(matches!(err, GatewayError::BucketNotFound { bucket } if bucket == "photos"));
    }

    #[test]
    fn missing_object_carries_context() {
        let err = translate(
            LedgerError::ObjectNotFound {
                bucket: "b".into(),
                object: "k".into(),
            },
            "b",
            "k",
            "v1",
        );
        match err {
            GatewayError::ObjectNotFound {
                bucket,
                object,
                version,
            } => {
                assert_eq!((bucket.as_str(), object.as_str(), version.as_str()), ("b", "k", "v1"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn kv_value_too_large() {
        let store = InMemoryKvStore::new(&KvConfig { max_value_size: 4 });
        let err = store.put("k", b"too long").unwrap_err();
        assert!(matches!(
            translate(err, "b", "k", ""),
            GatewayError::ValueTooLarge { size: 8, max: 4 }
        ));
    }

    #[test]
    fn malformed_record_is_an_invariant_error() {
        let err = translate(TypeError::Malformed("null hash".into()), "b", "k", "");
        assert!(matches!(err, GatewayError::Invariant { ref reason, .. } if reason.contains("null hash")));
    }

    #[test]
    fn other_failures_are_wrapped_with_source() {
        let err = translate(StoreError::NotFound(ContentHash::from_bytes(b"x")), "b", "k", "");
        assert!(matches!(
            err,
            GatewayError::Backend {
                source: BackendError::Store(StoreError::NotFound(_)),
                ..
            }
        ));
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("b/k"));
    }

    #[test]
    fn read_only_ledger_is_a_backend_error() {
        let err = translate(LedgerError::ReadOnly, "b", "k", "");
        assert!(matches!(err, GatewayError::Backend { .. }));
        assert!(!err.is_not_found());
    }
}
