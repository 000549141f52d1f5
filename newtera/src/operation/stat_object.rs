/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use tracing::Instrument;

use crate::backend::ObjectRequest;
use crate::error::Error;
use crate::sse::SseCustomerKey;
use crate::types::ObjectInfo;
use crate::validate;

/// Fluent builder for getting information about an object
#[derive(Debug)]
pub struct StatObjectFluentBuilder {
    handle: Arc<crate::client::Handle>,
    bucket: Option<String>,
    key: Option<String>,
    version_id: Option<String>,
    ssec: Option<SseCustomerKey>,
}

impl StatObjectFluentBuilder {
    pub(crate) fn new(handle: Arc<crate::client::Handle>) -> Self {
        Self {
            handle,
            bucket: None,
            key: None,
            version_id: None,
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

    /// Key the object was encrypted with, required for SSE-C objects.
    pub fn ssec(mut self, input: SseCustomerKey) -> Self {
        self.ssec = Some(input);
        self
    }

    /// Get the object information.
    ///
    /// Fails with [`ErrorKind::NotFound`](crate::error::ErrorKind::NotFound) if the object
    /// does not exist.
    pub async fn send(self) -> Result<ObjectInfo, Error> {
        let request = ObjectRequest {
            ssec: self.ssec,
            ..object_request(self.bucket, self.key, self.version_id)?
        };
        self.handle
            .config
            .backend()
            .stat_object(request)
            .instrument(tracing::debug_span!("send-head-object"))
            .await
    }
}

/// Validate the arguments identifying an object.
pub(crate) fn object_request(
    bucket: Option<String>,
    key: Option<String>,
    version_id: Option<String>,
) -> Result<ObjectRequest, Error> {
    let bucket = bucket.unwrap_or_default();
    let key = key.unwrap_or_default();
    validate::check_bucket_name(&bucket, false)?;
    validate::check_non_empty("object name", &key)?;
    Ok(ObjectRequest {
        bucket,
        key,
        version_id,
        ssec: None,
    })
}
