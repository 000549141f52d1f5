/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The storage service as seen by the client.
//!
//! Every operation of [`Client`](crate::Client) is carried out through a [`Backend`].
//! [`S3Backend`] talks to a Newtera server over its S3-compatible HTTP API; other
//! implementations can stand in for the service, e.g. in tests.

use std::collections::BTreeMap;
use std::fmt::Debug;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Error;
use crate::headers::ObjectHeaders;
use crate::io::ObjectBody;
use crate::sse::{ServerSideEncryption, SseCustomerKey};
use crate::types::{Bucket, CompletedPart, ObjectInfo};

mod s3;
pub use s3::S3Backend;

/// Response headers of a request, keyed in lower case.
pub type ResponseHeaders = BTreeMap<String, String>;

/// Write a whole object with a single request.
#[derive(Debug, Clone)]
pub struct PutObjectRequest {
    /// Bucket name
    pub bucket: String,
    /// Object name
    pub key: String,
    /// Content type and metadata
    pub headers: ObjectHeaders,
    /// Server-side encryption of the object
    pub sse: Option<ServerSideEncryption>,
    /// Object data
    pub body: Bytes,
}

/// Start a multipart upload.
#[derive(Debug, Clone)]
pub struct CreateMultipartUploadRequest {
    /// Bucket name
    pub bucket: String,
    /// Object name
    pub key: String,
    /// Content type and metadata of the object being assembled
    pub headers: ObjectHeaders,
    /// Server-side encryption of the object being assembled
    pub sse: Option<ServerSideEncryption>,
}

/// Upload one part of a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadPartRequest {
    /// Bucket name
    pub bucket: String,
    /// Object name
    pub key: String,
    /// Upload ID returned when the upload was started
    pub upload_id: String,
    /// 1-based part number
    pub part_number: i32,
    /// Headers sent with every part, keyed in lower case. Carries the SSE-C key of the upload.
    pub extra_headers: BTreeMap<String, String>,
    /// Part data
    pub body: Bytes,
}

/// Assemble the uploaded parts into an object.
#[derive(Debug, Clone)]
pub struct CompleteMultipartUploadRequest {
    /// Bucket name
    pub bucket: String,
    /// Object name
    pub key: String,
    /// Upload ID returned when the upload was started
    pub upload_id: String,
    /// Parts ordered by part number, contiguous from 1
    pub parts: Vec<CompletedPart>,
}

/// Discard a multipart upload and its parts.
#[derive(Debug, Clone)]
pub struct AbortMultipartUploadRequest {
    /// Bucket name
    pub bucket: String,
    /// Object name
    pub key: String,
    /// Upload ID returned when the upload was started
    pub upload_id: String,
}

/// Response to a completed object write.
#[derive(Debug, Clone, Default)]
pub struct WriteResponse {
    /// Entity tag of the written object, possibly quoted
    pub e_tag: Option<String>,
    /// Version ID of the written object
    pub version_id: Option<String>,
    /// Location of the object, returned by multipart completion
    pub location: Option<String>,
    /// Response headers
    pub headers: ResponseHeaders,
}

/// Address a single object, optionally a specific version of it.
#[derive(Debug, Clone)]
pub struct ObjectRequest {
    /// Bucket name
    pub bucket: String,
    /// Object name
    pub key: String,
    /// Version ID
    pub version_id: Option<String>,
    /// Key the object was encrypted with, for SSE-C objects
    pub ssec: Option<SseCustomerKey>,
}

/// Read an object, optionally a byte range of it.
#[derive(Debug, Clone)]
pub struct GetObjectRequest {
    /// Bucket name
    pub bucket: String,
    /// Object name
    pub key: String,
    /// Version ID
    pub version_id: Option<String>,
    /// Byte range to read
    pub range: Option<ByteRange>,
    /// Key the object was encrypted with, for SSE-C objects
    pub ssec: Option<SseCustomerKey>,
}

/// A range of bytes starting at `offset`, up to the end of the object when `length` is `None`
/// or zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte to read
    pub offset: u64,
    /// Number of bytes to read
    pub length: Option<u64>,
}

impl ByteRange {
    /// Value of the HTTP `Range` header for this range, `None` when it covers the whole object.
    pub fn header_value(&self) -> Option<String> {
        match (self.offset, self.length.filter(|length| *length > 0)) {
            (0, None) => None,
            (offset, None) => Some(format!("bytes={offset}-")),
            (offset, Some(length)) => match offset.checked_add(length - 1) {
                Some(last) => Some(format!("bytes={offset}-{last}")),
                // the range runs past any possible object end
                None => Some(format!("bytes={offset}-")),
            },
        }
    }
}

/// Object data and its description.
#[derive(Debug)]
pub struct GetObjectResponse {
    /// Object information from the response headers
    pub info: ObjectInfo,
    /// Object data
    pub body: ObjectBody,
}

/// Request a single page of a bucket listing.
#[derive(Debug, Clone, Default)]
pub struct ListObjectsRequest {
    /// Bucket name
    pub bucket: String,
    /// Only list keys beginning with this prefix
    pub prefix: Option<String>,
    /// Group keys sharing a prefix up to this delimiter into common prefixes
    pub delimiter: Option<String>,
    /// Start listing after this key
    pub start_after: Option<String>,
    /// Continuation token from the previous page
    pub continuation_token: Option<String>,
    /// Maximum number of keys per page
    pub max_keys: i32,
}

/// A single page of a bucket listing.
#[derive(Debug, Clone, Default)]
pub struct ListObjectsPage {
    /// Objects on this page
    pub objects: Vec<ObjectInfo>,
    /// Common prefixes on this page
    pub common_prefixes: Vec<String>,
    /// Token for the next page, `None` on the last page
    pub next_continuation_token: Option<String>,
}

/// A storage service reachable by the client.
#[async_trait]
pub trait Backend: Send + Sync + Debug {
    // Object writes

    /// Write an object with a single request.
    async fn put_object(&self, request: PutObjectRequest) -> Result<WriteResponse, Error>;

    /// Start a multipart upload, returning its upload ID.
    async fn create_multipart_upload(
        &self,
        request: CreateMultipartUploadRequest,
    ) -> Result<String, Error>;

    /// Upload one part, returning its entity tag.
    async fn upload_part(&self, request: UploadPartRequest) -> Result<String, Error>;

    /// Assemble the uploaded parts into the final object.
    async fn complete_multipart_upload(
        &self,
        request: CompleteMultipartUploadRequest,
    ) -> Result<WriteResponse, Error>;

    /// Discard a multipart upload.
    async fn abort_multipart_upload(&self, request: AbortMultipartUploadRequest)
        -> Result<(), Error>;

    // Buckets

    /// List all buckets owned by the caller.
    async fn list_buckets(&self) -> Result<Vec<Bucket>, Error>;

    /// Check whether a bucket exists.
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, Error>;

    // Object reads

    /// Get object information without its data.
    async fn stat_object(&self, request: ObjectRequest) -> Result<ObjectInfo, Error>;

    /// Get object data.
    async fn get_object(&self, request: GetObjectRequest) -> Result<GetObjectResponse, Error>;

    /// Remove an object.
    async fn remove_object(&self, request: ObjectRequest) -> Result<(), Error>;

    /// List a single page of objects.
    async fn list_objects(&self, request: ListObjectsRequest) -> Result<ListObjectsPage, Error>;
}
