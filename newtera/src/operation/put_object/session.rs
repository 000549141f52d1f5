/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use aws_sdk_s3::error::DisplayErrorContext;
use tracing::Instrument;

use crate::backend::{
    AbortMultipartUploadRequest, CompleteMultipartUploadRequest, CreateMultipartUploadRequest,
};
use crate::error::{self, Error, ErrorKind};
use crate::operation::put_object::context::UploadContext;
use crate::operation::put_object::ObjectWriteResult;
use crate::types::{AbortedUpload, CompletedPart, FailedMultipartUploadPolicy};

/// Lifecycle of a multipart upload.
///
/// ```text
/// Uninitiated -> Active -> Completing -> Done
///                   \          \
///                    `----------`-> Aborting -> Aborted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionState {
    Uninitiated,
    Active,
    Completing,
    Done,
    Aborting,
    Aborted,
}

/// A single multipart upload attempt.
///
/// The upload is created on the first call to [`initiate`](Self::initiate) and is
/// either completed or aborted, each at most once.
#[derive(Debug)]
pub(crate) struct MultipartSession {
    ctx: UploadContext,
    upload_id: Option<String>,
    parts: Vec<CompletedPart>,
    state: SessionState,
}

impl MultipartSession {
    pub(crate) fn new(ctx: UploadContext) -> Self {
        Self {
            ctx,
            upload_id: None,
            parts: Vec::new(),
            state: SessionState::Uninitiated,
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> SessionState {
        self.state
    }

    pub(crate) fn upload_id(&self) -> Option<&str> {
        self.upload_id.as_deref()
    }

    /// Start the multipart upload if it has not been started yet and return its upload ID.
    pub(crate) async fn initiate(&mut self) -> Result<&str, Error> {
        if self.state == SessionState::Uninitiated {
            let request = CreateMultipartUploadRequest {
                bucket: self.ctx.bucket().to_owned(),
                key: self.ctx.key().to_owned(),
                headers: self.ctx.request.headers.clone(),
                sse: self.ctx.request.sse.clone(),
            };
            let upload_id = self
                .ctx
                .backend()
                .create_multipart_upload(request)
                .instrument(tracing::debug_span!("send-create-multipart-upload"))
                .await?;
            tracing::debug!("multipart upload started with upload id: {upload_id}");
            self.upload_id = Some(upload_id);
            self.state = SessionState::Active;
        }

        match self.upload_id.as_deref() {
            Some(upload_id) if self.state == SessionState::Active => Ok(upload_id),
            _ => Err(Error::new(
                ErrorKind::RuntimeError,
                format!("multipart upload is not active: {:?}", self.state),
            )),
        }
    }

    /// Complete the upload with the uploaded parts, ordered by part number.
    pub(crate) async fn complete(
        &mut self,
        parts: Vec<CompletedPart>,
    ) -> Result<ObjectWriteResult, Error> {
        let upload_id = match (self.state, &self.upload_id) {
            (SessionState::Active, Some(upload_id)) => upload_id.clone(),
            (state, _) => {
                return Err(Error::new(
                    ErrorKind::RuntimeError,
                    format!("cannot complete multipart upload in state {state:?}"),
                ))
            }
        };

        self.parts = parts;
        self.state = SessionState::Completing;
        tracing::trace!(
            "completing multipart upload {upload_id} with {} parts",
            self.parts.len()
        );

        let request = CompleteMultipartUploadRequest {
            bucket: self.ctx.bucket().to_owned(),
            key: self.ctx.key().to_owned(),
            upload_id: upload_id.clone(),
            parts: std::mem::take(&mut self.parts),
        };
        let response = self
            .ctx
            .backend()
            .complete_multipart_upload(request)
            .instrument(tracing::debug_span!("send-complete-multipart-upload"))
            .await
            .map_err(error::completion_failed)?;

        self.state = SessionState::Done;
        Ok(ObjectWriteResult::from_response(
            self.ctx.bucket(),
            self.ctx.key(),
            Some(upload_id),
            response,
        ))
    }

    /// Abort the upload.
    ///
    /// Makes no request when the upload was never started or has already been aborted.
    pub(crate) async fn abort(&mut self) -> Result<AbortedUpload, Error> {
        match self.state {
            SessionState::Uninitiated => return Ok(AbortedUpload::default()),
            SessionState::Aborting | SessionState::Aborted => {
                return Ok(AbortedUpload::new(self.upload_id.clone()))
            }
            SessionState::Done => {
                return Err(Error::new(
                    ErrorKind::RuntimeError,
                    "multipart upload has already been completed",
                ))
            }
            SessionState::Active | SessionState::Completing => {}
        }

        let upload_id = match self.upload_id.clone() {
            Some(upload_id) => upload_id,
            None => {
                self.state = SessionState::Aborted;
                return Ok(AbortedUpload::default());
            }
        };

        self.state = SessionState::Aborting;
        let request = AbortMultipartUploadRequest {
            bucket: self.ctx.bucket().to_owned(),
            key: self.ctx.key().to_owned(),
            upload_id: upload_id.clone(),
        };
        let result = self
            .ctx
            .backend()
            .abort_multipart_upload(request)
            .instrument(tracing::debug_span!("send-abort-multipart-upload"))
            .await;
        self.state = SessionState::Aborted;
        self.parts.clear();

        result.map_err(error::abort_failed)?;
        Ok(AbortedUpload::new(Some(upload_id)))
    }

    /// Handle a failure of the upload according to the request's
    /// [`FailedMultipartUploadPolicy`], returning the error to report to the caller.
    pub(crate) async fn fail(&mut self, err: Error) -> Error {
        let upload_id = match self.upload_id() {
            Some(upload_id) => upload_id.to_owned(),
            None => return err,
        };

        match self.ctx.request.failed_multipart_upload_policy {
            FailedMultipartUploadPolicy::Retain => {
                tracing::warn!(
                    "multipart upload {upload_id} failed; retaining uploaded parts: {}",
                    DisplayErrorContext(&err)
                );
                err
            }
            FailedMultipartUploadPolicy::AbortUpload => {
                tracing::error!(
                    "multipart upload {upload_id} failed, aborting: {}",
                    DisplayErrorContext(&err)
                );
                match self.abort().await {
                    Ok(_) => err,
                    Err(abort_err) => {
                        tracing::warn!(
                            "failed to abort upload: {}",
                            DisplayErrorContext(&abort_err)
                        );
                        err.with_abort_failure(abort_err)
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MultipartSession, SessionState};
    use std::collections::HashMap;
    use crate::error::ErrorKind;
    use crate::headers::ObjectHeaders;
    use crate::operation::put_object::context::UploadContext;
    use crate::operation::put_object::PutObjectInput;
    use crate::types::{CompletedPart, FailedMultipartUploadPolicy};
    use aws_sdk_s3::error::ErrorMetadata;
    use aws_sdk_s3::operation::abort_multipart_upload::{
        AbortMultipartUploadError, AbortMultipartUploadOutput,
    };
    use aws_sdk_s3::operation::complete_multipart_upload::CompleteMultipartUploadOutput;
    use aws_sdk_s3::operation::create_multipart_upload::CreateMultipartUploadOutput;
    use aws_smithy_mocks_experimental::{mock, mock_client, Rule, RuleMode};

    fn session(rules: &[&Rule], policy: FailedMultipartUploadPolicy) -> MultipartSession {
        let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, rules);
        let config = crate::Config::builder().client(client).build();
        let tm = crate::Client::new(config);
        let input = PutObjectInput::builder()
            .bucket("test-bucket")
            .key("test-key")
            .failed_multipart_upload_policy(policy)
            .build()
            .unwrap();
        let headers = ObjectHeaders::normalize(None, &HashMap::new()).unwrap();
        MultipartSession::new(UploadContext::new(tm.handle.clone(), &input, headers))
    }

    fn create_mpu() -> Rule {
        mock!(aws_sdk_s3::Client::create_multipart_upload).then_output(|| {
            CreateMultipartUploadOutput::builder()
                .upload_id("upload-1")
                .build()
        })
    }

    #[tokio::test]
    async fn test_abort_is_idempotent() {
        let create = create_mpu();
        let abort = mock!(aws_sdk_s3::Client::abort_multipart_upload)
            .match_requests(|r| r.upload_id() == Some("upload-1"))
            .then_output(|| AbortMultipartUploadOutput::builder().build());
        let mut session = session(&[&create, &abort], Default::default());

        assert_eq!("upload-1", session.initiate().await.unwrap());
        assert_eq!(SessionState::Active, session.state());

        let aborted = session.abort().await.unwrap();
        assert_eq!(Some("upload-1"), aborted.upload_id());
        assert_eq!(SessionState::Aborted, session.state());

        // no second request; the sequential mock has no rule left for one
        let aborted = session.abort().await.unwrap();
        assert_eq!(Some("upload-1"), aborted.upload_id());
        assert_eq!(SessionState::Aborted, session.state());
    }

    #[tokio::test]
    async fn test_abort_before_initiate_is_noop() {
        let create = create_mpu();
        let mut session = session(&[&create], Default::default());
        let aborted = session.abort().await.unwrap();
        assert_eq!(None, aborted.upload_id());

        let err = crate::error::invalid_input("bad input");
        let err = session.fail(err).await;
        assert_eq!(&ErrorKind::InputInvalid, err.kind());
        assert!(err.abort_failure().is_none());
    }

    #[tokio::test]
    async fn test_failed_abort_is_secondary() {
        let create = create_mpu();
        let abort = mock!(aws_sdk_s3::Client::abort_multipart_upload).then_error(|| {
            AbortMultipartUploadError::generic(
                ErrorMetadata::builder().code("AccessDenied").build(),
            )
        });
        let mut session = session(&[&create, &abort], Default::default());
        session.initiate().await.unwrap();

        let err = session
            .fail(crate::error::part_upload_failed(2, "connection reset"))
            .await;
        assert!(
            matches!(err.kind(), ErrorKind::PartUploadFailed(failed) if failed.part_number() == 2)
        );
        assert_eq!(
            &ErrorKind::AbortFailed,
            err.abort_failure().expect("abort failure recorded").kind()
        );
        assert_eq!(SessionState::Aborted, session.state());
    }

    #[tokio::test]
    async fn test_retain_policy_skips_abort() {
        let create = create_mpu();
        let mut session = session(&[&create], FailedMultipartUploadPolicy::Retain);
        session.initiate().await.unwrap();

        let err = session
            .fail(crate::error::part_upload_failed(1, "connection reset"))
            .await;
        assert!(err.abort_failure().is_none());
        assert_eq!(SessionState::Active, session.state());
    }

    #[tokio::test]
    async fn test_complete_then_abort_rejected() {
        let create = create_mpu();
        let complete = mock!(aws_sdk_s3::Client::complete_multipart_upload).then_output(|| {
            CompleteMultipartUploadOutput::builder()
                .e_tag("\"final-1\"")
                .build()
        });
        let mut session = session(&[&create, &complete], Default::default());
        session.initiate().await.unwrap();

        let parts = vec![CompletedPart {
            part_number: 1,
            e_tag: "e1".to_owned(),
        }];
        let result = session.complete(parts).await.unwrap();
        assert_eq!(Some("final-1"), result.e_tag());
        assert_eq!(Some("upload-1"), result.upload_id());
        assert_eq!(SessionState::Done, session.state());

        let err = session.abort().await.unwrap_err();
        assert_eq!(&ErrorKind::RuntimeError, err.kind());
    }
}
