/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::path::Path;
use std::sync::Arc;

use crate::error::Error;
use crate::io::InputStream;
use crate::operation;
use crate::types::{ConcurrencySetting, PartSize};
use crate::Config;
use crate::DEFAULT_PARALLEL_UPLOADS;

/// Client for a Newtera TDM object storage service.
#[derive(Debug, Clone)]
pub struct Client {
    pub(crate) handle: Arc<Handle>,
}

/// Whatever is needed to carry out operations, e.g. config, backend, etc
#[derive(Debug)]
pub(crate) struct Handle {
    pub(crate) config: crate::Config,
}

impl Handle {
    /// Get the concrete number of parallel part uploads based on the concurrency setting.
    pub(crate) fn num_workers(&self) -> usize {
        match self.config.concurrency() {
            ConcurrencySetting::Explicit(concurrency) => *concurrency,
            ConcurrencySetting::Auto => DEFAULT_PARALLEL_UPLOADS,
        }
    }

    /// Get the configured part size for uploads, `0` to derive it from the object size.
    pub(crate) fn upload_part_size_bytes(&self) -> u64 {
        match self.config.part_size() {
            PartSize::Auto => 0,
            PartSize::Target(explicit) => *explicit,
        }
    }
}

impl Client {
    /// Creates a new client from a config.
    pub fn new(config: Config) -> Client {
        let handle = Arc::new(Handle { config });
        Client { handle }
    }

    /// Returns the client's configuration
    pub fn config(&self) -> &Config {
        &self.handle.config
    }

    /// Upload an object.
    ///
    /// Constructs a fluent builder for the
    /// [`PutObject`](crate::operation::put_object::builders::PutObjectFluentBuilder) operation.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use newtera::io::InputStream;
    ///
    /// async fn upload(client: &newtera::Client) -> Result<(), newtera::error::Error> {
    ///     let body = InputStream::from_reader(tokio::io::stdin(), None);
    ///     let result = client
    ///         .put_object()
    ///         .bucket("my-bucket")
    ///         .key("my-key")
    ///         .body(body)
    ///         .part_size(16 * 1024 * 1024)
    ///         .parallelism(4)
    ///         .send()
    ///         .await?;
    ///     println!("uploaded with etag {:?}", result.e_tag());
    ///     Ok(())
    /// }
    /// ```
    pub fn put_object(&self) -> operation::put_object::builders::PutObjectFluentBuilder {
        operation::put_object::builders::PutObjectFluentBuilder::new(self.handle.clone())
    }

    /// Upload the contents of a file.
    ///
    /// Same as [`put_object`](Self::put_object) with the file as body. The file size is
    /// read up front.
    pub fn fput_object(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<operation::put_object::builders::PutObjectFluentBuilder, Error> {
        let body = InputStream::from_path(path)?;
        Ok(self.put_object().body(body))
    }

    /// Download an object, or a range of it.
    pub fn get_object(&self) -> operation::get_object::GetObjectFluentBuilder {
        operation::get_object::GetObjectFluentBuilder::new(self.handle.clone())
    }

    /// Download an object into a file.
    ///
    /// The data is written to a temporary file next to the destination which is renamed
    /// once the download completes.
    pub fn fget_object(&self) -> operation::fget_object::FGetObjectFluentBuilder {
        operation::fget_object::FGetObjectFluentBuilder::new(self.handle.clone())
    }

    /// Get information about an object.
    pub fn stat_object(&self) -> operation::stat_object::StatObjectFluentBuilder {
        operation::stat_object::StatObjectFluentBuilder::new(self.handle.clone())
    }

    /// Remove an object.
    pub fn remove_object(&self) -> operation::remove_object::RemoveObjectFluentBuilder {
        operation::remove_object::RemoveObjectFluentBuilder::new(self.handle.clone())
    }

    /// List the objects of a bucket.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// async fn list(client: &newtera::Client) -> Result<(), newtera::error::Error> {
    ///     let mut objects = client
    ///         .list_objects()
    ///         .bucket("my-bucket")
    ///         .prefix("photos/")
    ///         .recursive(true)
    ///         .send()?;
    ///
    ///     while let Some(object) = objects.next().await {
    ///         let object = object?;
    ///         println!("{} {:?}", object.key, object.size);
    ///     }
    ///     Ok(())
    /// }
    /// ```
    pub fn list_objects(&self) -> operation::list_objects::ListObjectsFluentBuilder {
        operation::list_objects::ListObjectsFluentBuilder::new(self.handle.clone())
    }

    /// List all buckets owned by the authenticated user.
    pub async fn list_buckets(&self) -> Result<Vec<crate::types::Bucket>, Error> {
        operation::bucket::list_buckets(&self.handle).await
    }

    /// Check whether a bucket exists.
    pub async fn bucket_exists(&self, bucket: impl AsRef<str>) -> Result<bool, Error> {
        operation::bucket::bucket_exists(&self.handle, bucket.as_ref()).await
    }
}
