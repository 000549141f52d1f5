/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Error;
use crate::io::{InputStream, Progress};
use crate::sse::ServerSideEncryption;
use crate::types::FailedMultipartUploadPolicy;

use super::{ObjectWriteResult, PutObjectInputBuilder};

/// Fluent builder for uploading a single object
#[derive(Debug)]
pub struct PutObjectFluentBuilder {
    handle: Arc<crate::client::Handle>,
    inner: PutObjectInputBuilder,
}

impl PutObjectFluentBuilder {
    pub(crate) fn new(handle: Arc<crate::client::Handle>) -> Self {
        Self {
            handle,
            inner: ::std::default::Default::default(),
        }
    }

    /// Upload the object.
    ///
    /// Objects that fit in a single part are sent with one request. Anything larger is
    /// sent as a multipart upload which is aborted if any part fails, unless configured
    /// otherwise with [`failed_multipart_upload_policy`](Self::failed_multipart_upload_policy).
    pub async fn send(self) -> Result<ObjectWriteResult, Error> {
        let input = self.inner.build()?;
        crate::operation::put_object::PutObject::orchestrate(self.handle, input).await
    }

    /// Object data.
    pub fn body(mut self, input: InputStream) -> Self {
        self.inner = self.inner.body(input);
        self
    }

    /// Object data.
    pub fn set_body(mut self, input: Option<InputStream>) -> Self {
        self.inner = self.inner.set_body(input);
        self
    }

    /// The bucket name. This field is required.
    pub fn bucket(mut self, input: impl Into<String>) -> Self {
        self.inner = self.inner.bucket(input);
        self
    }

    /// The bucket name. This field is required.
    pub fn set_bucket(mut self, input: Option<String>) -> Self {
        self.inner = self.inner.set_bucket(input);
        self
    }

    /// Object name. This field is required.
    pub fn key(mut self, input: impl Into<String>) -> Self {
        self.inner = self.inner.key(input);
        self
    }

    /// Object name. This field is required.
    pub fn set_key(mut self, input: Option<String>) -> Self {
        self.inner = self.inner.set_key(input);
        self
    }

    /// Content type of the object. Default is `application/octet-stream`.
    pub fn content_type(mut self, input: impl Into<String>) -> Self {
        self.inner = self.inner.content_type(input);
        self
    }

    /// Content type of the object.
    pub fn set_content_type(mut self, input: Option<String>) -> Self {
        self.inner = self.inner.set_content_type(input);
        self
    }

    /// Adds a key-value pair to the object metadata.
    pub fn metadata(mut self, k: impl Into<String>, v: impl Into<String>) -> Self {
        self.inner = self.inner.metadata(k, v);
        self
    }

    /// User metadata and additional headers.
    pub fn set_metadata(mut self, input: Option<HashMap<String, String>>) -> Self {
        self.inner = self.inner.set_metadata(input);
        self
    }

    /// Part size in bytes, `0` to derive it from the object size.
    pub fn part_size(mut self, input: u64) -> Self {
        self.inner = self.inner.part_size(input);
        self
    }

    /// Part size in bytes, `0` to derive it from the object size.
    pub fn set_part_size(mut self, input: Option<u64>) -> Self {
        self.inner = self.inner.set_part_size(input);
        self
    }

    /// Number of parts uploaded in parallel.
    pub fn parallelism(mut self, input: usize) -> Self {
        self.inner = self.inner.parallelism(input);
        self
    }

    /// Number of parts uploaded in parallel.
    pub fn set_parallelism(mut self, input: Option<usize>) -> Self {
        self.inner = self.inner.set_parallelism(input);
        self
    }

    /// Receiver of progress notifications.
    pub fn progress(mut self, input: impl Progress + 'static) -> Self {
        self.inner = self.inner.progress(input);
        self
    }

    /// Receiver of progress notifications.
    pub fn set_progress(mut self, input: Option<Arc<dyn Progress>>) -> Self {
        self.inner = self.inner.set_progress(input);
        self
    }

    /// Server-side encryption of the object.
    ///
    /// With [`ServerSideEncryption::Customer`] the key is also sent with every part.
    pub fn sse(mut self, input: ServerSideEncryption) -> Self {
        self.inner = self.inner.sse(input);
        self
    }

    /// Server-side encryption of the object.
    pub fn set_sse(mut self, input: Option<ServerSideEncryption>) -> Self {
        self.inner = self.inner.set_sse(input);
        self
    }

    /// What happens to the uploaded parts if the multipart upload fails.
    pub fn failed_multipart_upload_policy(mut self, input: FailedMultipartUploadPolicy) -> Self {
        self.inner = self.inner.failed_multipart_upload_policy(input);
        self
    }

    /// What happens to the uploaded parts if the multipart upload fails.
    pub fn set_failed_multipart_upload_policy(
        mut self,
        input: Option<FailedMultipartUploadPolicy>,
    ) -> Self {
        self.inner = self.inner.set_failed_multipart_upload_policy(input);
        self
    }
}

impl PutObjectInputBuilder {
    /// Upload a single object with this input using the given client.
    pub async fn send_with(self, client: &crate::Client) -> Result<ObjectWriteResult, Error> {
        let mut fluent_builder = client.put_object();
        fluent_builder.inner = self;
        fluent_builder.send().await
    }
}
