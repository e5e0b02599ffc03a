//! Listing results and S3 common-prefix grouping.

use std::collections::HashSet;

use s3x_types::ObjectInfo;

/// Result of a ListObjects (v1) call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListObjectsInfo {
    pub is_truncated: bool,
    pub next_marker: Option<String>,
    pub objects: Vec<ObjectInfo>,
    pub prefixes: Vec<String>,
}

/// Parameters of a ListObjectsV2 call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListObjectsV2Params {
    pub prefix: String,
    pub continuation_token: String,
    pub delimiter: String,
    /// `0` means the page limit.
    pub max_keys: usize,
    pub fetch_owner: bool,
    pub start_after: String,
}

impl ListObjectsV2Params {
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Default::default()
        }
    }

    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    pub fn start_after(mut self, start_after: impl Into<String>) -> Self {
        self.start_after = start_after.into();
        self
    }

    pub fn max_keys(mut self, max_keys: usize) -> Self {
        self.max_keys = max_keys;
        self
    }
}

/// Result of a ListObjectsV2 call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListObjectsV2Info {
    pub is_truncated: bool,
    pub continuation_token: String,
    pub next_continuation_token: Option<String>,
    pub objects: Vec<ObjectInfo>,
    pub prefixes: Vec<String>,
}

/// Common prefix `name` folds into under `prefix` and `delimiter`, or
/// `None` when `name` is a direct child.
pub fn common_prefix(name: &str, prefix: &str, delimiter: &str) -> Option<String> {
    if delimiter.is_empty() {
        return None;
    }
    let suffix = name.strip_prefix(prefix).unwrap_or(name);
    let idx = suffix.find(delimiter)?;
    Some(format!("{prefix}{}{delimiter}", &suffix[..idx]))
}

/// Split a name-ordered listing into direct children and common prefixes.
///
/// An object whose name, past `prefix`, contains `delimiter` is folded into
/// the common prefix `prefix + <segment> + delimiter`. Each common prefix is
/// reported once, in first-seen order, and is also represented in the
/// object list by a zero-size pseudo-object that borrows bucket, etag and
/// modification time from the first object folded into it. Which member
/// lends that metadata is implementation-defined.
///
/// An empty `delimiter` groups nothing.
pub fn group_by_delimiter(
    objects: Vec<ObjectInfo>,
    prefix: &str,
    delimiter: &str,
) -> (Vec<ObjectInfo>, Vec<String>) {
    if delimiter.is_empty() {
        return (objects, Vec::new());
    }

    let mut seen = HashSet::new();
    let mut prefixes = Vec::new();
    let mut out = Vec::with_capacity(objects.len());
    for obj in objects {
        let Some(common) = common_prefix(&obj.name, prefix, delimiter) else {
            out.push(obj);
            continue;
        };
        if seen.insert(common.clone()) {
            out.push(ObjectInfo {
                bucket: obj.bucket.clone(),
                name: common.clone(),
                size: 0,
                mod_time: obj.mod_time,
                etag: obj.etag.clone(),
                ..Default::default()
            });
            prefixes.push(common);
        }
    }
    (out, prefixes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn obj(name: &str, etag: &str) -> ObjectInfo {
        ObjectInfo {
            bucket: "b".into(),
            name: name.into(),
            size: 10,
            etag: etag.into(),
            mod_time: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            ..Default::default()
        }
    }

    fn names(objects: &[ObjectInfo]) -> Vec<&str> {
        objects.iter().map(|o| o.name.as_str()).collect()
    }

    #[test]
    fn direct_children_and_common_prefixes() {
        let (objects, prefixes) = group_by_delimiter(
            vec![obj("a/b", "1"), obj("a/c/d", "2"), obj("a/c/e", "3")],
            "a/",
            "/",
        );
        assert_eq!(prefixes, ["a/c/"]);
        assert_eq!(names(&objects), ["a/b", "a/c/"]);
    }

    #[test]
    fn pseudo_object_borrows_first_member_metadata() {
        let (objects, _) =
            group_by_delimiter(vec![obj("a/c/d", "first"), obj("a/c/e", "second")], "a/", "/");
        let folder = &objects[0];
        assert_eq!(folder.name, "a/c/");
        assert_eq!(folder.size, 0);
        assert_eq!(folder.etag, "first");
        assert_eq!(folder.bucket, "b");
        assert!(folder.mod_time.is_some());
    }

    #[test]
    fn prefixes_are_deduplicated_in_first_seen_order() {
        let (objects, prefixes) = group_by_delimiter(
            vec![
                obj("x/1", "a"),
                obj("x/2", "b"),
                obj("y", "c"),
                obj("z/1", "d"),
                obj("z/2/3", "e"),
            ],
            "",
            "/",
        );
        assert_eq!(prefixes, ["x/", "z/"]);
        assert_eq!(names(&objects), ["x/", "y", "z/"]);
    }

    #[test]
    fn multi_character_delimiter() {
        let (objects, prefixes) =
            group_by_delimiter(vec![obj("logs--2024--01", "a"), obj("logs", "b")], "", "--");
        assert_eq!(prefixes, ["logs--"]);
        assert_eq!(names(&objects), ["logs--", "logs"]);
    }

    #[test]
    fn empty_delimiter_is_passthrough() {
        let input = vec![obj("a/b", "1"), obj("a/c/d", "2")];
        let (objects, prefixes) = group_by_delimiter(input.clone(), "a/", "");
        assert_eq!(objects, input);
        assert!(prefixes.is_empty());
    }

    #[test]
    fn names_outside_prefix_do_not_panic() {
        let (objects, prefixes) = group_by_delimiter(vec![obj("é/x", "1")], "zz", "/");
        assert_eq!(prefixes, ["zzé/"]);
        assert_eq!(objects.len(), 1);
    }

    #[test]
    fn prefix_equal_to_name_is_a_direct_child() {
        let (objects, prefixes) = group_by_delimiter(vec![obj("a/", "1")], "a/", "/");
        assert!(prefixes.is_empty());
        assert_eq!(names(&objects), ["a/"]);
    }

    #[test]
    fn common_prefix_of_names() {
        assert_eq!(common_prefix("a/c/d", "a/", "/").as_deref(), Some("a/c/"));
        assert_eq!(common_prefix("a/c/", "a/", "/").as_deref(), Some("a/c/"));
        assert_eq!(common_prefix("a/b", "a/", "/"), None);
        assert_eq!(common_prefix("a/", "a/", "/"), None);
        assert_eq!(common_prefix("a/c/d", "a/", ""), None);
    }

    #[test]
    fn v2_params_builder() {
        let params = ListObjectsV2Params::with_prefix("p/")
            .delimiter("/")
            .start_after("p/a")
            .max_keys(5);
        assert_eq!(params.prefix, "p/");
        assert_eq!(params.delimiter, "/");
        assert_eq!(params.start_after, "p/a");
        assert_eq!(params.max_keys, 5);
    }
}
