//! S3-style object operations for the s3x gateway.
//!
//! [`S3xGateway`] answers bucket and object requests by composing two
//! collaborators: a [`LedgerStore`](s3x_ledger::LedgerStore) holding object
//! metadata, and a [`ContentStore`](s3x_store::ContentStore) holding the
//! bytes under their content hash. Copies duplicate ledger records only;
//! blobs are shared.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use s3x_gateway::{GatewayConfig, PutObjReader, S3xGateway};
//! use s3x_ledger::InMemoryLedger;
//! use s3x_store::InMemoryContentStore;
//! use s3x_types::ObjectOptions;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let ledger = Arc::new(InMemoryLedger::new());
//! ledger.make_bucket("photos").unwrap();
//! let gateway = S3xGateway::new(
//!     ledger,
//!     Arc::new(InMemoryContentStore::new()),
//!     GatewayConfig::default(),
//! );
//!
//! let body = PutObjReader::from_bytes(&b"hello"[..]);
//! gateway
//!     .put_object("photos", "greeting.txt", body, &ObjectOptions::default())
//!     .await
//!     .unwrap();
//!
//! let mut out = Vec::new();
//! gateway
//!     .get_object("photos", "greeting.txt", 0, 5, &mut out)
//!     .await
//!     .unwrap();
//! assert_eq!(out, b"hello");
//! # }
//! ```

pub mod config;
pub mod error;
pub mod gateway;
pub mod listing;
pub mod lock;
pub mod metadata;
pub mod pipeline;
pub mod range;

// Re-exports for convenience.
pub use config::{GatewayConfig, DETERMINISTIC_TIMESTAMPS_ENV};
pub use error::{translate, BackendError, GatewayError, GatewayResult};
pub use gateway::{PutObjReader, S3xGateway, PLACEHOLDER_FILE_NAME, PLACEHOLDER_PAYLOAD};
pub use listing::{
    common_prefix, group_by_delimiter, ListObjectsInfo, ListObjectsV2Info, ListObjectsV2Params,
};
pub use lock::{lock_order, CopyLockGuard, LockManager, LockOrder};
pub use metadata::MetadataMapper;
pub use pipeline::{check_range, GetObjectReader};
pub use range::HttpRange;
