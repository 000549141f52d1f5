/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::HashMap;

use aws_smithy_types::DateTime;

/// The target part size for an upload request.
#[derive(Debug, Clone, Default)]
pub enum PartSize {
    /// Derive the part size from the object size so that the upload fits in the
    /// multipart part limit. Streams of unknown length require an explicit part size.
    #[default]
    Auto,

    /// Part size explicitly given.
    ///
    /// NOTE: Must lie within 5 MiB and 5 GiB. The last part of an upload may be smaller.
    Target(u64),
}

/// The concurrency settings to use for a single upload request.
#[derive(Debug, Clone, Default)]
pub enum ConcurrencySetting {
    /// Use the default number of parallel part uploads.
    #[default]
    Auto,

    /// Explicitly configured number of parallel part uploads. A value of `1` or less uploads
    /// parts inline, one after another.
    Explicit(usize),
}

/// Policy for how to handle a failed multipart upload
///
/// Default is to abort the upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FailedMultipartUploadPolicy {
    /// Abort the upload on any individual part failure
    #[default]
    AbortUpload,
    /// Retain any uploaded parts. The upload ID is logged so that the upload can be
    /// inspected or cleaned up later.
    Retain,
}

/// Describes the result of aborting an in-progress upload.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AbortedUpload {
    upload_id: Option<String>,
}

impl AbortedUpload {
    pub(crate) fn new(upload_id: Option<String>) -> Self {
        Self { upload_id }
    }

    /// Get the multipart upload ID that was cancelled
    ///
    /// Not present for uploads that never started a multipart upload.
    pub fn upload_id(&self) -> Option<&str> {
        self.upload_id.as_deref()
    }
}

/// A part of a multipart upload that the storage service has acknowledged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedPart {
    /// 1-based part number
    pub part_number: i32,
    /// Entity tag returned for the part
    pub e_tag: String,
}

/// A bucket as returned by [`list_buckets`](crate::Client::list_buckets)
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    /// Bucket name
    pub name: String,
    /// Creation time, when reported by the service
    pub creation_date: Option<DateTime>,
}

/// Information about an object.
///
/// Returned by [`stat_object`](crate::Client::stat_object) and, per entry, by
/// [`list_objects`](crate::Client::list_objects). Common prefixes of a non-recursive
/// listing are returned as entries where [`is_dir`](ObjectInfo::is_dir) is set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectInfo {
    /// Bucket holding the object
    pub bucket: String,
    /// Object name
    pub key: String,
    /// Last modification time
    pub last_modified: Option<DateTime>,
    /// Entity tag, without surrounding quotes
    pub e_tag: Option<String>,
    /// Size in bytes
    pub size: Option<u64>,
    /// Content type
    pub content_type: Option<String>,
    /// User metadata, keyed without the `x-amz-meta-` prefix
    pub metadata: HashMap<String, String>,
    /// Version ID, if versioning is enabled on the bucket
    pub version_id: Option<String>,
    /// Storage class
    pub storage_class: Option<String>,
    /// Set for common prefixes of a non-recursive listing
    pub is_dir: bool,
}

impl ObjectInfo {
    pub(crate) fn prefix(bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        ObjectInfo {
            bucket: bucket.into(),
            key: prefix.into(),
            is_dir: true,
            ..Default::default()
        }
    }
}

/// Strip the quotes that surround entity tags in HTTP responses.
pub(crate) fn trim_e_tag(e_tag: &str) -> String {
    let e_tag = e_tag.strip_prefix('"').unwrap_or(e_tag);
    e_tag.strip_suffix('"').unwrap_or(e_tag).to_owned()
}

#[cfg(test)]
mod tests {
    use super::trim_e_tag;

    #[test]
    fn test_trim_e_tag() {
        assert_eq!("abc", trim_e_tag("\"abc\""));
        assert_eq!("abc", trim_e_tag("abc"));
        assert_eq!("abc-3", trim_e_tag("\"abc-3"));
        assert_eq!("", trim_e_tag("\"\""));
    }
}
