//! Metadata ledger boundary for the s3x gateway.
//!
//! The ledger is the system of record mapping `(bucket, object)` to
//! [`LedgerObject`](s3x_types::LedgerObject) records. This crate provides:
//! - the [`LedgerStore`] trait the gateway talks to
//! - [`LockRegistry`], the keyed per-bucket read/write locks
//! - [`InMemoryLedger`] for tests and embedding

pub mod error;
pub mod locks;
pub mod memory;
pub mod traits;

pub use error::{LedgerError, LedgerResult};
pub use locks::{BucketReadGuard, BucketWriteGuard, LockRegistry};
pub use memory::InMemoryLedger;
pub use traits::LedgerStore;
