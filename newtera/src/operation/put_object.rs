/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/// Operation builders
pub mod builders;
mod input;
mod output;

mod context;
mod dispatcher;
pub(crate) mod part_size;
mod session;

use std::sync::Arc;

use tracing::Instrument;

use crate::backend::PutObjectRequest;
use crate::error;
use crate::headers::ObjectHeaders;
use crate::io::part_reader::{PartData, PartReader};
use crate::io::BoxReader;
use crate::validate;
use context::UploadContext;
use dispatcher::PartDispatcher;
use part_size::UploadPlan;
use session::MultipartSession;

/// Request type for uploading an object
pub use input::{PutObjectInput, PutObjectInputBuilder};
/// Response type for uploading an object
pub use output::ObjectWriteResult;
pub use part_size::{MAX_MULTIPART_COUNT, MAX_MULTIPART_OBJECT_SIZE, MAX_PART_SIZE, MIN_PART_SIZE};

/// Operation struct for single object upload
#[derive(Clone, Default, Debug)]
pub(crate) struct PutObject;

impl PutObject {
    /// Execute a single `PutObject` operation
    #[tracing::instrument(skip_all, level = "debug", name = "put-object")]
    pub(crate) async fn orchestrate(
        handle: Arc<crate::client::Handle>,
        mut input: PutObjectInput,
    ) -> Result<ObjectWriteResult, error::Error> {
        validate::check_bucket_name(&input.bucket, false)?;
        validate::check_non_empty("object name", &input.key)?;
        let headers = ObjectHeaders::normalize(
            input.content_type.as_deref(),
            input.metadata.iter().flatten(),
        )?;

        let stream = input.take_body();
        let object_size = stream.content_length();
        let part_size = input
            .part_size
            .unwrap_or_else(|| handle.upload_part_size_bytes());
        let parallelism = input.parallelism.unwrap_or_else(|| handle.num_workers());
        let plan = UploadPlan::compute(object_size, part_size)?;
        tracing::trace!(
            "upload of {object_size:?} bytes using part size {} ({:?} parts)",
            plan.part_size(),
            plan.part_count()
        );

        let progress = input.progress.clone();
        if let Some(progress) = &progress {
            progress.set_meta(&input.key, object_size);
        }

        let ctx = UploadContext::new(handle, &input, headers);
        let mut parts = PartReader::new(stream.into_reader().await?, plan, object_size)
            .with_progress(progress);

        let first = parts.next_part().await?.ok_or_else(|| {
            error::Error::new(error::ErrorKind::RuntimeError, "no data read from stream")
        })?;
        if first.is_last {
            tracing::trace!("object fits in a single part; sending as single PutObject request");
            return put_single(ctx, first).await;
        }

        let mut session = MultipartSession::new(ctx.clone());
        match upload_parts(&ctx, &mut session, &mut parts, first, parallelism).await {
            Ok(result) => Ok(result),
            Err(err) => Err(session.fail(err).await),
        }
    }
}

async fn put_single(ctx: UploadContext, part: PartData) -> Result<ObjectWriteResult, error::Error> {
    let request = PutObjectRequest {
        bucket: ctx.bucket().to_owned(),
        key: ctx.key().to_owned(),
        headers: ctx.request.headers.clone(),
        sse: ctx.request.sse.clone(),
        body: part.data,
    };
    let response = ctx
        .backend()
        .put_object(request)
        .instrument(tracing::debug_span!("send-put-object"))
        .await?;
    Ok(ObjectWriteResult::from_response(
        ctx.bucket(),
        ctx.key(),
        None,
        response,
    ))
}

/// Drive a multipart upload: initiate, upload every part and complete.
///
/// Parts are read while earlier parts are uploading. Reading stops at the first failed
/// part upload; a read error takes precedence over upload failures.
async fn upload_parts(
    ctx: &UploadContext,
    session: &mut MultipartSession,
    parts: &mut PartReader<BoxReader>,
    first: PartData,
    parallelism: usize,
) -> Result<ObjectWriteResult, error::Error> {
    let upload_id = session.initiate().await?.to_owned();
    let mut dispatcher = PartDispatcher::new(ctx.clone(), upload_id, parallelism);

    let mut read_result = dispatcher.dispatch(first).await;
    while read_result.is_ok() && !dispatcher.has_failed() {
        match parts.next_part().await {
            Ok(Some(part)) => read_result = dispatcher.dispatch(part).await,
            Ok(None) => break,
            Err(err) => read_result = Err(err),
        }
    }

    let uploaded = dispatcher.finish().await;
    read_result?;
    let completed = uploaded?;
    session.complete(completed).await
}

#[cfg(test)]
mod test {
    use crate::error::ErrorKind;
    use crate::io::InputStream;
    use crate::operation::put_object::PutObjectInput;
    use crate::sse::{ServerSideEncryption, SseCustomerKey};
    use crate::types::ConcurrencySetting;
    use crate::MEBIBYTE;
    use aws_sdk_s3::error::ErrorMetadata;
    use aws_sdk_s3::operation::abort_multipart_upload::AbortMultipartUploadOutput;
    use aws_sdk_s3::operation::complete_multipart_upload::CompleteMultipartUploadOutput;
    use aws_sdk_s3::operation::create_multipart_upload::CreateMultipartUploadOutput;
    use aws_sdk_s3::operation::put_object::PutObjectOutput;
    use aws_sdk_s3::operation::upload_part::{UploadPartError, UploadPartOutput};
    use aws_smithy_mocks_experimental::{mock, mock_client, RuleMode};
    use bytes::Bytes;

    fn body(len: u64) -> Bytes {
        Bytes::from(vec![b'x'; len as usize])
    }

    #[tokio::test]
    async fn test_basic_mpu() {
        let create_mpu = mock!(aws_sdk_s3::Client::create_multipart_upload).then_output(|| {
            CreateMultipartUploadOutput::builder()
                .upload_id("test-upload")
                .build()
        });
        let upload_1 = mock!(aws_sdk_s3::Client::upload_part)
            .match_requests(|r| {
                r.upload_id() == Some("test-upload")
                    && r.part_number() == Some(1)
                    && r.content_length() == Some(5 * MEBIBYTE as i64)
            })
            .then_output(|| UploadPartOutput::builder().e_tag("\"e1\"").build());
        let upload_2 = mock!(aws_sdk_s3::Client::upload_part)
            .match_requests(|r| {
                r.part_number() == Some(2) && r.content_length() == Some(5 * MEBIBYTE as i64)
            })
            .then_output(|| UploadPartOutput::builder().e_tag("\"e2\"").build());
        let upload_3 = mock!(aws_sdk_s3::Client::upload_part)
            .match_requests(|r| {
                r.part_number() == Some(3) && r.content_length() == Some(MEBIBYTE as i64)
            })
            .then_output(|| UploadPartOutput::builder().e_tag("\"e3\"").build());
        let complete_mpu = mock!(aws_sdk_s3::Client::complete_multipart_upload)
            .match_requests(|r| {
                r.upload_id() == Some("test-upload")
                    && r.multipart_upload().map(|mpu| mpu.parts().len()) == Some(3)
            })
            .then_output(|| {
                CompleteMultipartUploadOutput::builder()
                    .e_tag("\"test-e-tag-3\"")
                    .build()
            });

        let client = mock_client!(
            aws_sdk_s3,
            RuleMode::Sequential,
            &[&create_mpu, &upload_1, &upload_2, &upload_3, &complete_mpu]
        );
        let config = crate::Config::builder()
            .concurrency(ConcurrencySetting::Explicit(1))
            .client(client)
            .build();
        let tm = crate::Client::new(config);

        let request = PutObjectInput::builder()
            .bucket("test-bucket")
            .key("test-key")
            .part_size(5 * MEBIBYTE)
            .body(InputStream::from(body(11 * MEBIBYTE)));

        let resp = request.send_with(&tm).await.unwrap();
        assert_eq!(Some("test-upload"), resp.upload_id());
        assert_eq!(Some("test-e-tag-3"), resp.e_tag());
    }

    #[tokio::test]
    async fn test_customer_key_sent_with_every_part() {
        let key = SseCustomerKey::new([4u8; 32]).unwrap();
        let key_md5 = key.key_md5().to_owned();
        let create_mpu = mock!(aws_sdk_s3::Client::create_multipart_upload)
            .match_requests(|r| {
                r.sse_customer_algorithm() == Some("AES256") && r.server_side_encryption().is_none()
            })
            .then_output(|| {
                CreateMultipartUploadOutput::builder()
                    .upload_id("test-upload")
                    .build()
            });
        let upload_part = mock!(aws_sdk_s3::Client::upload_part)
            .match_requests(move |r| {
                r.sse_customer_algorithm() == Some("AES256")
                    && r.sse_customer_key_md5() == Some(key_md5.as_str())
            })
            .then_output(|| UploadPartOutput::builder().e_tag("\"e\"").build());
        let complete_mpu = mock!(aws_sdk_s3::Client::complete_multipart_upload)
            .then_output(|| CompleteMultipartUploadOutput::builder().build());

        let client = mock_client!(
            aws_sdk_s3,
            RuleMode::MatchAny,
            &[&create_mpu, &upload_part, &complete_mpu]
        );
        let config = crate::Config::builder()
            .concurrency(ConcurrencySetting::Explicit(2))
            .client(client)
            .build();
        let tm = crate::Client::new(config);

        tm.put_object()
            .bucket("test-bucket")
            .key("test-key")
            .part_size(5 * MEBIBYTE)
            .sse(ServerSideEncryption::Customer(key))
            .body(InputStream::from(body(11 * MEBIBYTE)))
            .send()
            .await
            .unwrap();
        assert_eq!(1, create_mpu.num_calls());
        assert_eq!(3, upload_part.num_calls());
        assert_eq!(1, complete_mpu.num_calls());
    }

    #[tokio::test]
    async fn test_basic_put_object() {
        let put_object = mock!(aws_sdk_s3::Client::put_object)
            .match_requests(|r| r.content_length() == Some(5 * MEBIBYTE as i64))
            .then_output(|| PutObjectOutput::builder().e_tag("\"test-etag\"").build());
        let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&put_object]);
        let tm = crate::Client::new(crate::Config::builder().client(client).build());

        let resp = tm
            .put_object()
            .bucket("test-bucket")
            .key("test-key")
            .body(InputStream::from(body(5 * MEBIBYTE)))
            .send()
            .await
            .unwrap();
        assert_eq!(None, resp.upload_id());
        assert_eq!(Some("test-etag"), resp.e_tag());
    }

    #[tokio::test]
    async fn test_failed_part_aborts_upload() {
        let create_mpu = mock!(aws_sdk_s3::Client::create_multipart_upload).then_output(|| {
            CreateMultipartUploadOutput::builder()
                .upload_id("test-upload")
                .build()
        });
        let upload_1 = mock!(aws_sdk_s3::Client::upload_part)
            .then_output(|| UploadPartOutput::builder().e_tag("\"e1\"").build());
        let upload_2 = mock!(aws_sdk_s3::Client::upload_part).then_error(|| {
            UploadPartError::generic(ErrorMetadata::builder().code("AccessDenied").build())
        });
        let abort = mock!(aws_sdk_s3::Client::abort_multipart_upload)
            .match_requests(|r| r.upload_id() == Some("test-upload"))
            .then_output(|| AbortMultipartUploadOutput::builder().build());

        let client = mock_client!(
            aws_sdk_s3,
            RuleMode::Sequential,
            &[&create_mpu, &upload_1, &upload_2, &abort]
        );
        let config = crate::Config::builder()
            .concurrency(ConcurrencySetting::Explicit(1))
            .client(client)
            .build();
        let tm = crate::Client::new(config);

        let err = tm
            .put_object()
            .bucket("test-bucket")
            .key("test-key")
            .part_size(5 * MEBIBYTE)
            .body(InputStream::from(body(11 * MEBIBYTE)))
            .send()
            .await
            .unwrap_err();
        assert!(
            matches!(err.kind(), ErrorKind::PartUploadFailed(failed) if failed.part_number() == 2)
        );
        assert!(err.abort_failure().is_none());
    }

    #[tokio::test]
    async fn test_invalid_bucket_rejected_before_any_request() {
        let put_object = mock!(aws_sdk_s3::Client::put_object)
            .then_output(|| PutObjectOutput::builder().build());
        let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&put_object]);
        let tm = crate::Client::new(crate::Config::builder().client(client).build());

        let err = tm
            .put_object()
            .bucket("ab")
            .key("test-key")
            .body(InputStream::from_static(b"hello"))
            .send()
            .await
            .unwrap_err();
        assert_eq!(&ErrorKind::InputInvalid, err.kind());

        let err = tm
            .put_object()
            .bucket("test-bucket")
            .body(InputStream::from_static(b"hello"))
            .send()
            .await
            .unwrap_err();
        assert_eq!(&ErrorKind::InputInvalid, err.kind());
    }
}
