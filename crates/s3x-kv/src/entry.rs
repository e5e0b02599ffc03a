use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::KvResult;

/// Block size that encoded namespace entries are padded to.
pub const KV_NS_ENTRY_PADDING: usize = 4 * 1024;

/// Namespace record for a KV-backed value.
///
/// Field names on the wire are `Key`, `Size`, `ModTime` and `IDs`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KvNsEntry {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Size")]
    pub size: i64,
    #[serde(rename = "ModTime")]
    pub mod_time: DateTime<Utc>,
    /// Block IDs holding the value, in order.
    #[serde(rename = "IDs", default)]
    pub ids: Vec<String>,
}

impl KvNsEntry {
    pub fn new(key: impl Into<String>, size: i64, mod_time: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            size,
            mod_time,
            ids: Vec::new(),
        }
    }
}

/// Encode an entry as JSON zero-padded to the next multiple of
/// [`KV_NS_ENTRY_PADDING`].
///
/// JSON output never holds a raw zero byte (control characters in strings
/// are written as `\u0000` escapes), so the first zero is always the start
/// of the padding.
pub fn encode(entry: &KvNsEntry) -> KvResult<Vec<u8>> {
    let json = serde_json::to_vec(entry)?;
    let padded_len = json.len().div_ceil(KV_NS_ENTRY_PADDING) * KV_NS_ENTRY_PADDING;
    let mut padded = vec![0u8; padded_len];
    padded[..json.len()].copy_from_slice(&json);
    Ok(padded)
}

/// Decode an entry produced by [`encode`], ignoring the zero padding.
pub fn decode(bytes: &[u8]) -> KvResult<KvNsEntry> {
    let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
    Ok(serde_json::from_slice(&bytes[..end])?)
}
