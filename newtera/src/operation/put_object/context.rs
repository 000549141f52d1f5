/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::backend::Backend;
use crate::headers::ObjectHeaders;
use crate::operation::put_object::PutObjectInput;
use crate::sse::ServerSideEncryption;
use crate::types::FailedMultipartUploadPolicy;

/// Internal context used to drive a single PutObject operation
#[derive(Debug, Clone)]
pub(crate) struct UploadContext {
    /// reference to client handle used to do actual work
    pub(crate) handle: Arc<crate::client::Handle>,
    /// what is being uploaded and how (the body is read separately)
    pub(crate) request: Arc<UploadRequest>,
}

#[derive(Debug)]
pub(crate) struct UploadRequest {
    pub(crate) bucket: String,
    pub(crate) key: String,
    pub(crate) headers: ObjectHeaders,
    pub(crate) sse: Option<ServerSideEncryption>,
    /// sent with every part, the SSE-C key of the object if any
    pub(crate) part_headers: BTreeMap<String, String>,
    pub(crate) failed_multipart_upload_policy: FailedMultipartUploadPolicy,
}

impl UploadContext {
    pub(crate) fn new(
        handle: Arc<crate::client::Handle>,
        input: &PutObjectInput,
        headers: ObjectHeaders,
    ) -> Self {
        let request = UploadRequest {
            bucket: input.bucket.clone(),
            key: input.key.clone(),
            headers,
            sse: input.sse.clone(),
            part_headers: input
                .sse
                .as_ref()
                .and_then(ServerSideEncryption::customer_key)
                .map(|key| key.headers())
                .unwrap_or_default(),
            failed_multipart_upload_policy: input
                .failed_multipart_upload_policy
                .clone()
                .unwrap_or_default(),
        };
        Self {
            handle,
            request: Arc::new(request),
        }
    }

    /// The backend to send requests to
    pub(crate) fn backend(&self) -> &dyn Backend {
        self.handle.config.backend()
    }

    pub(crate) fn bucket(&self) -> &str {
        &self.request.bucket
    }

    pub(crate) fn key(&self) -> &str {
        &self.request.key
    }
}
