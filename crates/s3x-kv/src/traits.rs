use crate::entry::{decode, encode, KvNsEntry};
use crate::error::KvResult;

/// Key-value backend holding namespace entries and value blocks.
///
/// Implementations must be thread-safe and must refuse values larger than
/// their configured maximum with [`KvError::ValueTooLarge`].
///
/// [`KvError::ValueTooLarge`]: crate::error::KvError::ValueTooLarge
pub trait KvStore: Send + Sync {
    /// Store `value` under `key`, replacing any previous value.
    fn put(&self, key: &str, value: &[u8]) -> KvResult<()>;

    /// Read the value stored under `key`.
    ///
    /// Returns `Err(KvError::NotFound)` if the key is absent.
    fn get(&self, key: &str) -> KvResult<Vec<u8>>;

    /// Delete `key`. Returns `true` if it existed.
    fn delete(&self, key: &str) -> KvResult<bool>;

    /// Encode and store a namespace entry under its own key.
    fn put_entry(&self, entry: &KvNsEntry) -> KvResult<()> {
        self.put(&entry.key, &encode(entry)?)
    }

    /// Read and decode the namespace entry stored under `key`.
    fn get_entry(&self, key: &str) -> KvResult<KvNsEntry> {
        decode(&self.get(key)?)
    }
}
