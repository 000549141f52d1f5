/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use tracing::Instrument;

use crate::error::Error;
use crate::operation::stat_object::object_request;

/// Fluent builder for removing an object
#[derive(Debug)]
pub struct RemoveObjectFluentBuilder {
    handle: Arc<crate::client::Handle>,
    bucket: Option<String>,
    key: Option<String>,
    version_id: Option<String>,
}

impl RemoveObjectFluentBuilder {
    pub(crate) fn new(handle: Arc<crate::client::Handle>) -> Self {
        Self {
            handle,
            bucket: None,
            key: None,
            version_id: None,
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

    /// Version of the object to remove.
    pub fn version_id(mut self, input: impl Into<String>) -> Self {
        self.version_id = Some(input.into());
        self
    }

    /// Remove the object.
    pub async fn send(self) -> Result<(), Error> {
        let request = object_request(self.bucket, self.key, self.version_id)?;
        self.handle
            .config
            .backend()
            .remove_object(request)
            .instrument(tracing::debug_span!("send-delete-object"))
            .await
    }
}
