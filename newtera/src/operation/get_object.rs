/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use tracing::Instrument;

use crate::backend::{ByteRange, GetObjectRequest};
use crate::error::Error;
use crate::operation::stat_object::object_request;
use crate::sse::SseCustomerKey;

pub use crate::backend::GetObjectResponse;

/// Fluent builder for downloading a single object
#[derive(Debug)]
pub struct GetObjectFluentBuilder {
    handle: Arc<crate::client::Handle>,
    bucket: Option<String>,
    key: Option<String>,
    version_id: Option<String>,
    offset: u64,
    length: Option<u64>,
    ssec: Option<SseCustomerKey>,
}

impl GetObjectFluentBuilder {
    pub(crate) fn new(handle: Arc<crate::client::Handle>) -> Self {
        Self {
            handle,
            bucket: None,
            key: None,
            version_id: None,
            offset: 0,
            length: None,
            ssec: None,
        }
    }

    /// The bucket name. This field is required.
    pub fn bucket(mut self, input: impl Into<String>) -> Self {
        self.bucket = Some(input.into());
        self
    }

    /// Object name. This field is required.
    pub fn key(mut self, input: impl Into<String>) -> Self {
        self.key = Some(input.into());
        self
    }

    /// Version of the object.
    pub fn version_id(mut self, input: impl Into<String>) -> Self {
        self.version_id = Some(input.into());
        self
    }

    /// First byte of the object to download. Default is `0`.
    pub fn offset(mut self, input: u64) -> Self {
        self.offset = input;
        self
    }

    /// Number of bytes to download from `offset`. `0` or unset reads to the end of the object.
    pub fn length(mut self, input: u64) -> Self {
        self.length = Some(input);
        self
    }

    /// Key the object was encrypted with, required for SSE-C objects.
    pub fn ssec(mut self, input: SseCustomerKey) -> Self {
        self.ssec = Some(input);
        self
    }

    /// Start the download. The object data is streamed from the returned body.
    pub async fn send(self) -> Result<GetObjectResponse, Error> {
        let object = object_request(self.bucket, self.key, self.version_id)?;
        let range = ByteRange {
            offset: self.offset,
            length: self.length,
        };
        let request = GetObjectRequest {
            bucket: object.bucket,
            key: object.key,
            version_id: object.version_id,
            range: range.header_value().map(|_| range),
            ssec: self.ssec,
        };
        self.handle
            .config
            .backend()
            .get_object(request)
            .instrument(tracing::debug_span!("send-get-object"))
            .await
    }
}
