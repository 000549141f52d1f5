/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use crate::backend::{Backend, S3Backend};
use crate::types::{ConcurrencySetting, PartSize};

/// Load a [`Config`] for a Newtera endpoint
pub mod loader;

/// Configuration for a [`Client`](crate::client::Client)
#[derive(Debug, Clone)]
pub struct Config {
    part_size: PartSize,
    concurrency: ConcurrencySetting,
    backend: Arc<dyn Backend>,
}

impl Config {
    /// Create a new `Config` builder
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Returns a reference to the default part size for uploads
    pub fn part_size(&self) -> &PartSize {
        &self.part_size
    }

    /// Returns the default number of parallel part uploads of a single upload.
    pub fn concurrency(&self) -> &ConcurrencySetting {
        &self.concurrency
    }

    /// The storage backend requests are sent to.
    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }
}

/// Fluent style builder for [Config]
#[derive(Debug, Clone, Default)]
pub struct Builder {
    part_size: PartSize,
    concurrency: ConcurrencySetting,
    backend: Option<Arc<dyn Backend>>,
}

impl Builder {
    /// The size of each part when an upload is split into parts.
    ///
    /// Must lie within 5 MiB and 5 GiB; this is checked when an upload starts. Individual
    /// requests may override it.
    ///
    /// Default is [PartSize::Auto]
    pub fn part_size(mut self, part_size: PartSize) -> Self {
        self.part_size = part_size;
        self
    }

    /// Set the number of parts of a single upload that are uploaded in parallel.
    ///
    /// Default is [ConcurrencySetting::Auto].
    pub fn concurrency(mut self, concurrency: ConcurrencySetting) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set an explicit S3 client to send requests with.
    pub fn client(self, client: aws_sdk_s3::Client) -> Self {
        self.backend(S3Backend::new(client))
    }

    /// Set the storage backend to send requests to.
    pub fn backend(mut self, backend: impl Backend + 'static) -> Self {
        self.backend = Some(Arc::new(backend));
        self
    }

    /// Consumes the builder and constructs a [`Config`](crate::config::Config)
    ///
    /// # Panics
    ///
    /// Panics if neither [`client`](Self::client) nor [`backend`](Self::backend) was set.
    pub fn build(self) -> Config {
        Config {
            part_size: self.part_size,
            concurrency: self.concurrency,
            backend: self.backend.expect("client or backend set"),
        }
    }
}
