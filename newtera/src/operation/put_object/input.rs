/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::HashMap;
use std::sync::Arc;

use aws_smithy_types::error::operation::BuildError;

use crate::io::{InputStream, Progress};
use crate::sse::ServerSideEncryption;
use crate::types::FailedMultipartUploadPolicy;

/// Input type for uploading a single object
#[non_exhaustive]
#[derive(Debug)]
pub struct PutObjectInput {
    pub(crate) body: InputStream,
    pub(crate) bucket: String,
    pub(crate) key: String,
    pub(crate) content_type: Option<String>,
    pub(crate) metadata: Option<HashMap<String, String>>,
    pub(crate) part_size: Option<u64>,
    pub(crate) parallelism: Option<usize>,
    pub(crate) progress: Option<Arc<dyn Progress>>,
    pub(crate) sse: Option<ServerSideEncryption>,
    pub(crate) failed_multipart_upload_policy: Option<FailedMultipartUploadPolicy>,
}

impl PutObjectInput {
    /// Creates a new builder-style object to manufacture [`PutObjectInput`].
    pub fn builder() -> PutObjectInputBuilder {
        PutObjectInputBuilder::default()
    }

    /// Take the body of this request, leaving an empty one in its place.
    pub(crate) fn take_body(&mut self) -> InputStream {
        std::mem::take(&mut self.body)
    }

    /// The object data.
    pub fn body(&self) -> &InputStream {
        &self.body
    }

    /// The bucket name.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Object name.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Content type, `application/octet-stream` when not given.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// User metadata and additional headers.
    pub fn metadata(&self) -> Option<&HashMap<String, String>> {
        self.metadata.as_ref()
    }

    /// Part size overriding the client configuration, `0` to derive it from the object size.
    pub fn part_size(&self) -> Option<u64> {
        self.part_size
    }

    /// Number of parallel part uploads overriding the client configuration.
    pub fn parallelism(&self) -> Option<usize> {
        self.parallelism
    }

    /// Receiver of progress notifications.
    pub fn progress(&self) -> Option<&Arc<dyn Progress>> {
        self.progress.as_ref()
    }

    /// Server-side encryption of the object.
    pub fn sse(&self) -> Option<&ServerSideEncryption> {
        self.sse.as_ref()
    }

    /// What happens to the uploaded parts if the multipart upload fails.
    pub fn failed_multipart_upload_policy(&self) -> Option<&FailedMultipartUploadPolicy> {
        self.failed_multipart_upload_policy.as_ref()
    }
}

/// A builder for [`PutObjectInput`].
#[non_exhaustive]
#[derive(Debug, Default)]
pub struct PutObjectInputBuilder {
    pub(crate) body: Option<InputStream>,
    pub(crate) bucket: Option<String>,
    pub(crate) key: Option<String>,
    pub(crate) content_type: Option<String>,
    pub(crate) metadata: Option<HashMap<String, String>>,
    pub(crate) part_size: Option<u64>,
    pub(crate) parallelism: Option<usize>,
    pub(crate) progress: Option<Arc<dyn Progress>>,
    pub(crate) sse: Option<ServerSideEncryption>,
    pub(crate) failed_multipart_upload_policy: Option<FailedMultipartUploadPolicy>,
}

impl PutObjectInputBuilder {
    /// Object data.
    pub fn body(mut self, input: InputStream) -> Self {
        self.body = Some(input);
        self
    }

    /// Object data.
    pub fn set_body(mut self, input: Option<InputStream>) -> Self {
        self.body = input;
        self
    }

    /// The bucket name. This field is required.
    pub fn bucket(mut self, input: impl Into<String>) -> Self {
        self.bucket = Some(input.into());
        self
    }

    /// The bucket name. This field is required.
    pub fn set_bucket(mut self, input: Option<String>) -> Self {
        self.bucket = input;
        self
    }

    /// Object name. This field is required.
    pub fn key(mut self, input: impl Into<String>) -> Self {
        self.key = Some(input.into());
        self
    }

    /// Object name. This field is required.
    pub fn set_key(mut self, input: Option<String>) -> Self {
        self.key = input;
        self
    }

    /// Content type of the object.
    pub fn content_type(mut self, input: impl Into<String>) -> Self {
        self.content_type = Some(input.into());
        self
    }

    /// Content type of the object.
    pub fn set_content_type(mut self, input: Option<String>) -> Self {
        self.content_type = input;
        self
    }

    /// Adds a key-value pair to `metadata`.
    ///
    /// Keys other than standard content headers and `x-amz-*` headers are sent as user
    /// metadata (`x-amz-meta-*`). Values must be US-ASCII.
    pub fn metadata(mut self, k: impl Into<String>, v: impl Into<String>) -> Self {
        let mut hash_map = self.metadata.unwrap_or_default();
        hash_map.insert(k.into(), v.into());
        self.metadata = Some(hash_map);
        self
    }

    /// User metadata and additional headers.
    pub fn set_metadata(mut self, input: Option<HashMap<String, String>>) -> Self {
        self.metadata = input;
        self
    }

    /// Part size in bytes overriding the client configuration.
    ///
    /// Must lie within 5 MiB and 5 GiB, or be `0` to derive the part size from the object
    /// size. Required for streams of unknown length unless configured on the client.
    pub fn part_size(mut self, input: u64) -> Self {
        self.part_size = Some(input);
        self
    }

    /// Part size in bytes overriding the client configuration.
    pub fn set_part_size(mut self, input: Option<u64>) -> Self {
        self.part_size = input;
        self
    }

    /// Number of parts uploaded in parallel, overriding the client configuration.
    pub fn parallelism(mut self, input: usize) -> Self {
        self.parallelism = Some(input);
        self
    }

    /// Number of parts uploaded in parallel, overriding the client configuration.
    pub fn set_parallelism(mut self, input: Option<usize>) -> Self {
        self.parallelism = input;
        self
    }

    /// Receiver of progress notifications.
    pub fn progress(mut self, input: impl Progress + 'static) -> Self {
        self.progress = Some(Arc::new(input));
        self
    }

    /// Receiver of progress notifications.
    pub fn set_progress(mut self, input: Option<Arc<dyn Progress>>) -> Self {
        self.progress = input;
        self
    }

    /// Server-side encryption of the object.
    ///
    /// With [`ServerSideEncryption::Customer`] the key is also sent with every part of a
    /// multipart upload.
    pub fn sse(mut self, input: ServerSideEncryption) -> Self {
        self.sse = Some(input);
        self
    }

    /// Server-side encryption of the object.
    pub fn set_sse(mut self, input: Option<ServerSideEncryption>) -> Self {
        self.sse = input;
        self
    }

    /// What happens to the uploaded parts if the multipart upload fails.
    ///
    /// Default is [`FailedMultipartUploadPolicy::AbortUpload`].
    pub fn failed_multipart_upload_policy(mut self, input: FailedMultipartUploadPolicy) -> Self {
        self.failed_multipart_upload_policy = Some(input);
        self
    }

    /// What happens to the uploaded parts if the multipart upload fails.
    pub fn set_failed_multipart_upload_policy(
        mut self,
        input: Option<FailedMultipartUploadPolicy>,
    ) -> Self {
        self.failed_multipart_upload_policy = input;
        self
    }

    /// Consumes the builder and constructs a [`PutObjectInput`].
    pub fn build(self) -> Result<PutObjectInput, BuildError> {
        Ok(PutObjectInput {
            body: self.body.unwrap_or_default(),
            bucket: self
                .bucket
                .ok_or_else(|| BuildError::missing_field("bucket", "A bucket is required"))?,
            key: self
                .key
                .ok_or_else(|| BuildError::missing_field("key", "A key is required"))?,
            content_type: self.content_type,
            metadata: self.metadata,
            part_size: self.part_size,
            parallelism: self.parallelism,
            progress: self.progress,
            sse: self.sse,
            failed_multipart_upload_policy: self.failed_multipart_upload_policy,
        })
    }
}
