//! Foundation types for the s3x gateway.
//!
//! Every other s3x crate depends on `s3x-types`.
//!
//! # Key Types
//!
//! - [`ContentHash`]: content address of a blob (BLAKE3 digest)
//! - [`ObjectInfo`]: caller-facing object metadata
//! - [`LedgerObject`]: ledger record: content address plus metadata
//! - [`ObjectOptions`]: per-request headers and user metadata

pub mod error;
pub mod hash;
pub mod object;

pub use error::TypeError;
pub use hash::ContentHash;
pub use object::{LedgerObject, ObjectInfo, ObjectOptions, CONTENT_HASH_HEADER};
