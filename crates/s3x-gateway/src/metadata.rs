//! Mapping between request options, ledger records and caller-facing object metadata.

use chrono::{DateTime, Utc};
use s3x_types::{ContentHash, LedgerObject, ObjectInfo, ObjectOptions, CONTENT_HASH_HEADER};

/// Converts between ledger records and caller-facing object info.
///
/// Whether new records get a wall-clock modification time is decided by the
/// injected `deterministic_timestamps` flag, never by ambient state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MetadataMapper {
    deterministic_timestamps: bool,
}

impl MetadataMapper {
    pub fn new(deterministic_timestamps: bool) -> Self {
        Self {
            deterministic_timestamps,
        }
    }

    pub fn deterministic_timestamps(&self) -> bool {
        self.deterministic_timestamps
    }

    /// Modification time for a record created or rewritten now.
    pub fn now(&self) -> Option<DateTime<Utc>> {
        if self.deterministic_timestamps {
            None
        } else {
            Some(Utc::now())
        }
    }

    /// Build the metadata for a freshly uploaded object.
    ///
    /// The four content headers are matched case-insensitively and moved
    /// into their fields; every other header is kept verbatim.
    pub fn new_object_info(
        &self,
        bucket: &str,
        name: &str,
        size: u64,
        hash: &ContentHash,
        opts: &ObjectOptions,
    ) -> ObjectInfo {
        let mut info = ObjectInfo {
            bucket: bucket.to_string(),
            name: name.to_string(),
            size,
            mod_time: self.now(),
            etag: hash.to_hex(),
            ..Default::default()
        };
        for (key, value) in &opts.user_defined {
            match key.to_ascii_lowercase().as_str() {
                "content-encoding" => info.content_encoding = value.clone(),
                "content-disposition" => info.content_disposition = value.clone(),
                "content-language" => info.content_language = value.clone(),
                "content-type" => info.content_type = value.clone(),
                _ => {
                    info.user_defined.insert(key.clone(), value.clone());
                }
            }
        }
        info
    }

    /// Caller-facing view of a ledger record, exposing its content address
    /// under [`CONTENT_HASH_HEADER`].
    pub fn to_object_info(record: &LedgerObject) -> ObjectInfo {
        let mut info = record.info.clone();
        info.user_defined
            .insert(CONTENT_HASH_HEADER.to_string(), record.data_hash.to_hex());
        info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(pairs: &[(&str, &str)]) -> ObjectOptions {
        ObjectOptions {
            user_defined: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn content_headers_are_recognised_case_insensitively() {
        let hash = ContentHash::from_bytes(b"x");
        let info = MetadataMapper::new(true).new_object_info(
            "b",
            "k",
            1,
            &hash,
            &opts(&[
                ("Content-Type", "text/plain"),
                ("CONTENT-ENCODING", "gzip"),
                ("content-disposition", "inline"),
                ("Content-Language", "en"),
            ]),
        );
        assert_eq!(info.content_type, "text/plain");
        assert_eq!(info.content_encoding, "gzip");
        assert_eq!(info.content_disposition, "inline");
        assert_eq!(info.content_language, "en");
        assert!(info.user_defined.is_empty());
    }

    #[test]
    fn unrecognised_headers_are_preserved_verbatim() {
        let hash = ContentHash::from_bytes(b"x");
        let info = MetadataMapper::new(true).new_object_info(
            "b",
            "k",
            1,
            &hash,
            &opts(&[("X-Amz-Meta-Owner", "alice")]),
        );
        assert_eq!(info.user_defined.get("X-Amz-Meta-Owner").unwrap(), "alice");
    }

    #[test]
    fn deterministic_mode_leaves_mod_time_unset() {
        let hash = ContentHash::from_bytes(b"x");
        let mapper = MetadataMapper::new(true);
        let a = mapper.new_object_info("b", "k", 1, &hash, &ObjectOptions::default());
        let b = mapper.new_object_info("b", "k", 1, &hash, &ObjectOptions::default());
        assert!(a.mod_time.is_none());
        assert_eq!(a, b);
    }

    #[test]
    fn wall_clock_mode_sets_mod_time() {
        let before = Utc::now();
        let hash = ContentHash::from_bytes(b"x");
        let info =
            MetadataMapper::new(false).new_object_info("b", "k", 1, &hash, &ObjectOptions::default());
        assert!(info.mod_time.unwrap() >= before);
    }

    #[test]
    fn etag_is_the_content_hash() {
        let hash = ContentHash::from_bytes(b"x");
        let info = MetadataMapper::default().new_object_info("b", "k", 1, &hash, &ObjectOptions::default());
        assert_eq!(info.etag, hash.to_hex());
    }

    #[test]
    fn caller_view_exposes_content_hash() {
        let hash = ContentHash::from_bytes(b"payload");
        let info = MetadataMapper::new(true).new_object_info("b", "k", 7, &hash, &ObjectOptions::default());
        let record = LedgerObject::new(hash, info);
        let view = MetadataMapper::to_object_info(&record);
        assert_eq!(view.user_defined.get(CONTENT_HASH_HEADER), Some(&hash.to_hex()));
        assert!(!record.info.user_defined.contains_key(CONTENT_HASH_HEADER));
    }
}
