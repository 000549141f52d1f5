/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use tracing::Instrument;

use crate::client::Handle;
use crate::error::Error;
use crate::types::Bucket;
use crate::validate;

pub(crate) async fn list_buckets(handle: &Handle) -> Result<Vec<Bucket>, Error> {
    let buckets = handle
        .config
        .backend()
        .list_buckets()
        .instrument(tracing::debug_span!("send-list-buckets"))
        .await?;
    tracing::trace!("listed {} buckets", buckets.len());
    Ok(buckets)
}

pub(crate) async fn bucket_exists(handle: &Handle, bucket: &str) -> Result<bool, Error> {
    validate::check_bucket_name(bucket, false)?;
    handle
        .config
        .backend()
        .bucket_exists(bucket)
        .instrument(tracing::debug_span!("send-head-bucket", bucket))
        .await
}
