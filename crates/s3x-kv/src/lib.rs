//! KV namespace metadata for the s3x gateway.
//!
//! Namespace entries describe a key, its size and modification time, and the
//! ordered list of block IDs that hold its value. They are stored as
//! fixed-size records: JSON, zero-padded to a multiple of
//! [`KV_NS_ENTRY_PADDING`].
//!
//! # Design Rules
//!
//! 1. Encoded entries are always a positive multiple of the block size.
//! 2. Decoding stops at the first zero byte. JSON escapes NUL in strings, so
//!    an encoded entry never holds a zero byte before its padding.
//! 3. Values larger than the configured maximum are refused by the store.

pub mod config;
pub mod entry;
pub mod error;
pub mod memory;
pub mod traits;

pub use config::{KvConfig, DEFAULT_MAX_VALUE_SIZE, MAX_VALUE_SIZE_ENV};
pub use entry::{decode, encode, KvNsEntry, KV_NS_ENTRY_PADDING};
pub use error::{KvError, KvResult};
pub use memory::InMemoryKvStore;
pub use traits::KvStore;
