//! Content-addressed blob storage for the s3x gateway.
//!
//! Blobs are keyed by the BLAKE3 hash of their bytes and never interpreted.
//! The gateway talks to a real backend through the [`ContentStore`] trait;
//! [`InMemoryContentStore`] backs tests and embedding.
//!
//! # Design Rules
//!
//! 1. Blobs are immutable once written (content-addressing guarantees this).
//! 2. An upload either stores every byte or none of them.
//! 3. Downloads never materialize more than one chunk per write.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod hasher;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use hasher::ContentHasher;
pub use memory::{InMemoryContentStore, CHUNK_SIZE};
pub use traits::ContentStore;
