/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use aws_sdk_s3::operation::RequestId;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, StorageClass};
use aws_smithy_types::base64;

use super::{
    AbortMultipartUploadRequest, Backend, CompleteMultipartUploadRequest,
    CreateMultipartUploadRequest, GetObjectRequest, GetObjectResponse, ListObjectsPage,
    ListObjectsRequest, ObjectRequest, PutObjectRequest, ResponseHeaders, UploadPartRequest,
    WriteResponse,
};
use crate::error::{Error, ErrorKind};
use crate::headers::ObjectHeaders;
use crate::io::ObjectBody;
use crate::sse::{self, ServerSideEncryption, SseCustomerKey};
use crate::types::{trim_e_tag, Bucket, ObjectInfo};

const STORAGE_CLASS: &str = "x-amz-storage-class";
const TAGGING: &str = "x-amz-tagging";
const WEBSITE_REDIRECT_LOCATION: &str = "x-amz-website-redirect-location";

/// [`Backend`] speaking the S3-compatible HTTP API of a Newtera server.
///
/// Request signing, retries of transport errors and response parsing are done by the
/// wrapped [`aws_sdk_s3::Client`].
#[derive(Debug, Clone)]
pub struct S3Backend {
    client: aws_sdk_s3::Client,
}

impl S3Backend {
    /// Create a backend sending requests with `client`
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

fn metadata(headers: &ObjectHeaders) -> Option<HashMap<String, String>> {
    if headers.metadata.is_empty() {
        None
    } else {
        Some(headers.metadata.clone())
    }
}

fn storage_class(headers: &ObjectHeaders) -> Option<StorageClass> {
    headers
        .extra
        .get(STORAGE_CLASS)
        .map(|class| StorageClass::from(class.as_str()))
}

fn warn_unsupported(headers: &ObjectHeaders) {
    for key in headers.extra.keys() {
        if ![STORAGE_CLASS, TAGGING, WEBSITE_REDIRECT_LOCATION].contains(&key.as_str()) {
            tracing::warn!("header {key} is not supported and will not be sent");
        }
    }
}

/// SSE-C request fields
#[derive(Debug, Default)]
struct CustomerKeyFields {
    algorithm: Option<String>,
    key: Option<String>,
    key_md5: Option<String>,
}

impl CustomerKeyFields {
    fn new(key: Option<&SseCustomerKey>) -> Self {
        match key {
            Some(key) => Self {
                algorithm: Some(key.algorithm().to_owned()),
                key: Some(key.key().to_owned()),
                key_md5: Some(key.key_md5().to_owned()),
            },
            None => Self::default(),
        }
    }

    /// Take the SSE-C headers out of `headers`, warning about any others left behind.
    fn from_part_headers(mut headers: BTreeMap<String, String>) -> Self {
        let fields = Self {
            algorithm: headers.remove(sse::SSE_C_ALGORITHM),
            key: headers.remove(sse::SSE_C_KEY),
            key_md5: headers.remove(sse::SSE_C_KEY_MD5),
        };
        for key in headers.keys() {
            tracing::warn!("header {key} is not supported on parts and will not be sent");
        }
        fields
    }
}

/// Encryption fields of object writes
#[derive(Debug, Default)]
struct EncryptionFields {
    server_side_encryption: Option<aws_sdk_s3::types::ServerSideEncryption>,
    kms_key_id: Option<String>,
    kms_context: Option<String>,
    customer: CustomerKeyFields,
}

impl EncryptionFields {
    fn new(sse: Option<&ServerSideEncryption>) -> Self {
        use aws_sdk_s3::types::ServerSideEncryption as Algorithm;
        match sse {
            Some(ServerSideEncryption::S3) => Self {
                server_side_encryption: Some(Algorithm::Aes256),
                ..Default::default()
            },
            Some(ServerSideEncryption::Kms { key_id, context }) => Self {
                server_side_encryption: Some(Algorithm::AwsKms),
                kms_key_id: Some(key_id.clone()),
                kms_context: context.as_ref().map(base64::encode),
                ..Default::default()
            },
            Some(ServerSideEncryption::Customer(key)) => Self {
                customer: CustomerKeyFields::new(Some(key)),
                ..Default::default()
            },
            None => Self::default(),
        }
    }
}

fn response_headers<const N: usize>(pairs: [(&str, Option<&str>); N]) -> ResponseHeaders {
    pairs
        .into_iter()
        .filter_map(|(name, value)| value.map(|value| (name.to_owned(), value.to_owned())))
        .collect()
}

fn size(content_length: Option<i64>) -> Option<u64> {
    content_length.and_then(|len| u64::try_from(len).ok())
}

#[async_trait]
impl Backend for S3Backend {
    async fn put_object(&self, request: PutObjectRequest) -> Result<WriteResponse, Error> {
        let PutObjectRequest {
            bucket,
            key,
            headers,
            sse,
            body,
        } = request;
        warn_unsupported(&headers);
        let encryption = EncryptionFields::new(sse.as_ref());

        let resp = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(headers.content_type.clone())
            .set_cache_control(headers.cache_control.clone())
            .set_content_encoding(headers.content_encoding.clone())
            .set_content_disposition(headers.content_disposition.clone())
            .set_content_language(headers.content_language.clone())
            .set_metadata(metadata(&headers))
            .set_storage_class(storage_class(&headers))
            .set_tagging(headers.extra.get(TAGGING).cloned())
            .set_website_redirect_location(headers.extra.get(WEBSITE_REDIRECT_LOCATION).cloned())
            .set_server_side_encryption(encryption.server_side_encryption)
            .set_ssekms_key_id(encryption.kms_key_id)
            .set_ssekms_encryption_context(encryption.kms_context)
            .set_sse_customer_algorithm(encryption.customer.algorithm)
            .set_sse_customer_key(encryption.customer.key)
            .set_sse_customer_key_md5(encryption.customer.key_md5)
            .content_length(body.len() as i64)
            .body(ByteStream::from(body))
            .send()
            .await?;

        Ok(WriteResponse {
            e_tag: resp.e_tag().map(str::to_owned),
            version_id: resp.version_id().map(str::to_owned),
            location: None,
            headers: response_headers([
                ("etag", resp.e_tag()),
                ("x-amz-version-id", resp.version_id()),
                ("x-amz-expiration", resp.expiration()),
                ("x-amz-request-id", resp.request_id()),
            ]),
        })
    }

    async fn create_multipart_upload(
        &self,
        request: CreateMultipartUploadRequest,
    ) -> Result<String, Error> {
        let CreateMultipartUploadRequest {
            bucket,
            key,
            headers,
            sse,
        } = request;
        warn_unsupported(&headers);
        let encryption = EncryptionFields::new(sse.as_ref());

        let resp = self
            .client
            .create_multipart_upload()
            .bucket(bucket)
            .key(key)
            .content_type(headers.content_type.clone())
            .set_cache_control(headers.cache_control.clone())
            .set_content_encoding(headers.content_encoding.clone())
            .set_content_disposition(headers.content_disposition.clone())
            .set_content_language(headers.content_language.clone())
            .set_metadata(metadata(&headers))
            .set_storage_class(storage_class(&headers))
            .set_tagging(headers.extra.get(TAGGING).cloned())
            .set_website_redirect_location(headers.extra.get(WEBSITE_REDIRECT_LOCATION).cloned())
            .set_server_side_encryption(encryption.server_side_encryption)
            .set_ssekms_key_id(encryption.kms_key_id)
            .set_ssekms_encryption_context(encryption.kms_context)
            .set_sse_customer_algorithm(encryption.customer.algorithm)
            .set_sse_customer_key(encryption.customer.key)
            .set_sse_customer_key_md5(encryption.customer.key_md5)
            .send()
            .await?;

        resp.upload_id().map(str::to_owned).ok_or_else(|| {
            Error::new(
                ErrorKind::ValidationFailed,
                "CreateMultipartUpload response did not include an upload ID",
            )
        })
    }

    async fn upload_part(&self, request: UploadPartRequest) -> Result<String, Error> {
        let customer = CustomerKeyFields::from_part_headers(request.extra_headers);
        let resp = self
            .client
            .upload_part()
            .bucket(request.bucket)
            .key(request.key)
            .upload_id(request.upload_id)
            .part_number(request.part_number)
            .set_sse_customer_algorithm(customer.algorithm)
            .set_sse_customer_key(customer.key)
            .set_sse_customer_key_md5(customer.key_md5)
            .content_length(request.body.len() as i64)
            .body(ByteStream::from(request.body))
            .send()
            .await?;

        resp.e_tag().map(str::to_owned).ok_or_else(|| {
            Error::new(
                ErrorKind::ValidationFailed,
                format!(
                    "UploadPart response for part {} did not include an ETag",
                    request.part_number
                ),
            )
        })
    }

    async fn complete_multipart_upload(
        &self,
        request: CompleteMultipartUploadRequest,
    ) -> Result<WriteResponse, Error> {
        let parts = request
            .parts
            .into_iter()
            .map(|part| {
                aws_sdk_s3::types::CompletedPart::builder()
                    .part_number(part.part_number)
                    .e_tag(part.e_tag)
                    .build()
            })
            .collect();

        let resp = self
            .client
            .complete_multipart_upload()
            .bucket(request.bucket)
            .key(request.key)
            .upload_id(request.upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(parts))
                    .build(),
            )
            .send()
            .await?;

        Ok(WriteResponse {
            e_tag: resp.e_tag().map(str::to_owned),
            version_id: resp.version_id().map(str::to_owned),
            location: resp.location().map(str::to_owned),
            headers: response_headers([
                ("etag", resp.e_tag()),
                ("x-amz-version-id", resp.version_id()),
                ("x-amz-expiration", resp.expiration()),
                ("x-amz-request-id", resp.request_id()),
            ]),
        })
    }

    async fn abort_multipart_upload(
        &self,
        request: AbortMultipartUploadRequest,
    ) -> Result<(), Error> {
        self.client
            .abort_multipart_upload()
            .bucket(request.bucket)
            .key(request.key)
            .upload_id(request.upload_id)
            .send()
            .await?;
        Ok(())
    }

    async fn list_buckets(&self) -> Result<Vec<Bucket>, Error> {
        let resp = self.client.list_buckets().send().await?;
        Ok(resp
            .buckets()
            .iter()
            .map(|bucket| Bucket {
                name: bucket.name().unwrap_or_default().to_owned(),
                creation_date: bucket.creation_date().cloned(),
            })
            .collect())
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool, Error> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(err) if err.as_service_error().is_some_and(|e| e.is_not_found()) => Ok(false),
            Err(err) => {
                let err = Error::from(err);
                match err.kind() {
                    ErrorKind::NotFound => Ok(false),
                    _ => Err(err),
                }
            }
        }
    }

    async fn stat_object(&self, request: ObjectRequest) -> Result<ObjectInfo, Error> {
        let customer = CustomerKeyFields::new(request.ssec.as_ref());
        let resp = self
            .client
            .head_object()
            .bucket(&request.bucket)
            .key(&request.key)
            .set_version_id(request.version_id)
            .set_sse_customer_algorithm(customer.algorithm)
            .set_sse_customer_key(customer.key)
            .set_sse_customer_key_md5(customer.key_md5)
            .send()
            .await
            .map_err(|err| match err.as_service_error() {
                Some(e) if e.is_not_found() => Error::new(ErrorKind::NotFound, err),
                _ => Error::from(err),
            })?;

        Ok(ObjectInfo {
            bucket: request.bucket,
            key: request.key,
            last_modified: resp.last_modified().cloned(),
            e_tag: resp.e_tag().map(trim_e_tag),
            size: size(resp.content_length()),
            content_type: resp.content_type().map(str::to_owned),
            metadata: resp.metadata().cloned().unwrap_or_default(),
            version_id: resp.version_id().map(str::to_owned),
            storage_class: resp.storage_class().map(|s| s.as_str().to_owned()),
            is_dir: false,
        })
    }

    async fn get_object(&self, request: GetObjectRequest) -> Result<GetObjectResponse, Error> {
        let customer = CustomerKeyFields::new(request.ssec.as_ref());
        let resp = self
            .client
            .get_object()
            .bucket(&request.bucket)
            .key(&request.key)
            .set_version_id(request.version_id)
            .set_range(request.range.and_then(|range| range.header_value()))
            .set_sse_customer_algorithm(customer.algorithm)
            .set_sse_customer_key(customer.key)
            .set_sse_customer_key_md5(customer.key_md5)
            .send()
            .await
            .map_err(|err| match err.as_service_error() {
                Some(e) if e.is_no_such_key() => Error::new(ErrorKind::NotFound, err),
                _ => Error::from(err),
            })?;

        let info = ObjectInfo {
            bucket: request.bucket,
            key: request.key,
            last_modified: resp.last_modified().cloned(),
            e_tag: resp.e_tag().map(trim_e_tag),
            size: size(resp.content_length()),
            content_type: resp.content_type().map(str::to_owned),
            metadata: resp.metadata().cloned().unwrap_or_default(),
            version_id: resp.version_id().map(str::to_owned),
            storage_class: resp.storage_class().map(|s| s.as_str().to_owned()),
            is_dir: false,
        };

        Ok(GetObjectResponse {
            info,
            body: ObjectBody::from_reader(resp.body.into_async_read()),
        })
    }

    async fn remove_object(&self, request: ObjectRequest) -> Result<(), Error> {
        self.client
            .delete_object()
            .bucket(request.bucket)
            .key(request.key)
            .set_version_id(request.version_id)
            .send()
            .await?;
        Ok(())
    }

    async fn list_objects(&self, request: ListObjectsRequest) -> Result<ListObjectsPage, Error> {
        let resp = self
            .client
            .list_objects_v2()
            .bucket(&request.bucket)
            .set_prefix(request.prefix)
            .set_delimiter(request.delimiter)
            .set_start_after(request.start_after)
            .set_continuation_token(request.continuation_token)
            .max_keys(request.max_keys)
            .send()
            .await?;

        let objects = resp
            .contents()
            .iter()
            .map(|object| ObjectInfo {
                bucket: request.bucket.clone(),
                key: object.key().unwrap_or_default().to_owned(),
                last_modified: object.last_modified().cloned(),
                e_tag: object.e_tag().map(trim_e_tag),
                size: size(object.size()),
                storage_class: object.storage_class().map(|s| s.as_str().to_owned()),
                ..Default::default()
            })
            .collect();
        let common_prefixes = resp
            .common_prefixes()
            .iter()
            .filter_map(|prefix| prefix.prefix().map(str::to_owned))
            .collect();

        let next_continuation_token = match resp.is_truncated() {
            Some(true) => match resp.next_continuation_token() {
                Some(token) => Some(token.to_owned()),
                None => {
                    return Err(Error::new(
                        ErrorKind::ValidationFailed,
                        "truncated ListObjectsV2 response did not include a continuation token",
                    ))
                }
            },
            _ => None,
        };

        Ok(ListObjectsPage {
            objects,
            common_prefixes,
            next_continuation_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::S3Backend;
    use crate::backend::{
        Backend, ByteRange, CompleteMultipartUploadRequest, CreateMultipartUploadRequest,
        GetObjectRequest, ListObjectsRequest, ObjectRequest, PutObjectRequest, UploadPartRequest,
    };
    use crate::error::ErrorKind;
    use crate::headers::ObjectHeaders;
    use crate::sse::{ServerSideEncryption, SseCustomerKey};
    use crate::types::CompletedPart;
    use aws_sdk_s3::error::ErrorMetadata;
    use aws_sdk_s3::operation::complete_multipart_upload::CompleteMultipartUploadOutput;
    use aws_sdk_s3::operation::create_multipart_upload::CreateMultipartUploadOutput;
    use aws_sdk_s3::operation::get_object::GetObjectOutput;
    use aws_sdk_s3::operation::head_bucket::{HeadBucketError, HeadBucketOutput};
    use aws_sdk_s3::operation::head_object::{HeadObjectError, HeadObjectOutput};
    use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Output;
    use aws_sdk_s3::operation::put_object::PutObjectOutput;
    use aws_sdk_s3::operation::upload_part::UploadPartOutput;
    use aws_sdk_s3::primitives::ByteStream;
    use aws_sdk_s3::types::error::NotFound;
    use aws_sdk_s3::types::{CommonPrefix, Object};
    use aws_smithy_mocks_experimental::{mock, mock_client, RuleMode};
    use aws_smithy_types::base64;
    use bytes::Bytes;
    use std::collections::{BTreeMap, HashMap};

    #[tokio::test]
    async fn test_put_object_maps_headers() {
        let put_object = mock!(aws_sdk_s3::Client::put_object)
            .match_requests(|r| {
                r.bucket() == Some("test-bucket")
                    && r.key() == Some("test-key")
                    && r.content_type() == Some("text/plain")
                    && r.content_length() == Some(5)
                    && r.metadata().and_then(|m| m.get("project")).map(String::as_str)
                        == Some("alpha")
            })
            .then_output(|| {
                PutObjectOutput::builder()
                    .e_tag("\"abc\"")
                    .version_id("v1")
                    .build()
            });
        let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&put_object]);
        let backend = S3Backend::new(client);

        let metadata = HashMap::from([("project".to_owned(), "alpha".to_owned())]);
        let resp = backend
            .put_object(PutObjectRequest {
                bucket: "test-bucket".to_owned(),
                key: "test-key".to_owned(),
                headers: ObjectHeaders::normalize(Some("text/plain"), &metadata).unwrap(),
                sse: None,
                body: Bytes::from_static(b"hello"),
            })
            .await
            .unwrap();

        assert_eq!(Some("\"abc\""), resp.e_tag.as_deref());
        assert_eq!(Some("v1"), resp.version_id.as_deref());
        assert_eq!(Some(&"v1".to_owned()), resp.headers.get("x-amz-version-id"));
    }

    #[tokio::test]
    async fn test_put_object_maps_kms_encryption() {
        let context = r#"{"project":"alpha"}"#;
        let put_object = mock!(aws_sdk_s3::Client::put_object)
            .match_requests(move |r| {
                r.server_side_encryption()
                    == Some(&aws_sdk_s3::types::ServerSideEncryption::AwsKms)
                    && r.ssekms_key_id() == Some("key-1")
                    && r.ssekms_encryption_context() == Some(base64::encode(context).as_str())
                    && r.sse_customer_algorithm().is_none()
            })
            .then_output(|| PutObjectOutput::builder().e_tag("\"abc\"").build());
        let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&put_object]);
        let backend = S3Backend::new(client);

        backend
            .put_object(PutObjectRequest {
                bucket: "test-bucket".to_owned(),
                key: "test-key".to_owned(),
                headers: ObjectHeaders::normalize(None, &HashMap::new()).unwrap(),
                sse: Some(ServerSideEncryption::Kms {
                    key_id: "key-1".to_owned(),
                    context: Some(context.to_owned()),
                }),
                body: Bytes::from_static(b"hello"),
            })
            .await
            .unwrap();
        assert_eq!(1, put_object.num_calls());
    }

    #[tokio::test]
    async fn test_multipart_maps_customer_key() {
        let key = SseCustomerKey::new([3u8; 32]).unwrap();
        let key_md5 = key.key_md5().to_owned();
        let create = mock!(aws_sdk_s3::Client::create_multipart_upload)
            .match_requests({
                let key_md5 = key_md5.clone();
                move |r| {
                    r.sse_customer_algorithm() == Some("AES256")
                        && r.sse_customer_key_md5() == Some(key_md5.as_str())
                        && r.server_side_encryption().is_none()
                }
            })
            .then_output(|| {
                CreateMultipartUploadOutput::builder()
                    .upload_id("upload-1")
                    .build()
            });
        let upload_part = mock!(aws_sdk_s3::Client::upload_part)
            .match_requests({
                let expected_key = key.key().to_owned();
                move |r| {
                    r.sse_customer_algorithm() == Some("AES256")
                        && r.sse_customer_key() == Some(expected_key.as_str())
                        && r.sse_customer_key_md5() == Some(key_md5.as_str())
                }
            })
            .then_output(|| UploadPartOutput::builder().e_tag("\"e1\"").build());
        let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&create, &upload_part]);
        let backend = S3Backend::new(client);

        let upload_id = backend
            .create_multipart_upload(CreateMultipartUploadRequest {
                bucket: "test-bucket".to_owned(),
                key: "test-key".to_owned(),
                headers: ObjectHeaders::normalize(None, &HashMap::new()).unwrap(),
                sse: Some(ServerSideEncryption::Customer(key.clone())),
            })
            .await
            .unwrap();
        let e_tag = backend
            .upload_part(UploadPartRequest {
                bucket: "test-bucket".to_owned(),
                key: "test-key".to_owned(),
                upload_id,
                part_number: 1,
                extra_headers: key.headers(),
                body: Bytes::from_static(b"part"),
            })
            .await
            .unwrap();

        assert_eq!("\"e1\"", e_tag);
        assert_eq!(1, create.num_calls());
        assert_eq!(1, upload_part.num_calls());
    }

    #[tokio::test]
    async fn test_part_without_extra_headers() {
        let upload_part = mock!(aws_sdk_s3::Client::upload_part)
            .match_requests(|r| {
                r.sse_customer_algorithm().is_none() && r.sse_customer_key().is_none()
            })
            .then_output(|| UploadPartOutput::builder().e_tag("\"e1\"").build());
        let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&upload_part]);
        let backend = S3Backend::new(client);

        backend
            .upload_part(UploadPartRequest {
                bucket: "test-bucket".to_owned(),
                key: "test-key".to_owned(),
                upload_id: "upload-1".to_owned(),
                part_number: 1,
                extra_headers: BTreeMap::new(),
                body: Bytes::from_static(b"part"),
            })
            .await
            .unwrap();
        assert_eq!(1, upload_part.num_calls());
    }

    #[tokio::test]
    async fn test_reads_send_customer_key() {
        let key = SseCustomerKey::new([5u8; 32]).unwrap();
        let head_object = mock!(aws_sdk_s3::Client::head_object)
            .match_requests({
                let key_md5 = key.key_md5().to_owned();
                move |r| {
                    r.sse_customer_algorithm() == Some("AES256")
                        && r.sse_customer_key_md5() == Some(key_md5.as_str())
                }
            })
            .then_output(|| HeadObjectOutput::builder().content_length(4).build());
        let get_object = mock!(aws_sdk_s3::Client::get_object)
            .match_requests({
                let key = key.key().to_owned();
                move |r| {
                    r.sse_customer_algorithm() == Some("AES256")
                        && r.sse_customer_key() == Some(key.as_str())
                        && r.range() == Some("bytes=1-2")
                }
            })
            .then_output(|| {
                GetObjectOutput::builder()
                    .content_length(2)
                    .body(ByteStream::from_static(b"at"))
                    .build()
            });
        let client = mock_client!(
            aws_sdk_s3,
            RuleMode::Sequential,
            &[&head_object, &get_object]
        );
        let backend = S3Backend::new(client);

        let info = backend
            .stat_object(ObjectRequest {
                bucket: "test-bucket".to_owned(),
                key: "test-key".to_owned(),
                version_id: None,
                ssec: Some(key.clone()),
            })
            .await
            .unwrap();
        assert_eq!(Some(4), info.size);

        let resp = backend
            .get_object(GetObjectRequest {
                bucket: "test-bucket".to_owned(),
                key: "test-key".to_owned(),
                version_id: None,
                range: Some(ByteRange {
                    offset: 1,
                    length: Some(2),
                }),
                ssec: Some(key),
            })
            .await
            .unwrap();
        assert_eq!(Some(2), resp.info.size);
    }

    #[tokio::test]
    async fn test_complete_sends_parts_in_order() {
        let complete = mock!(aws_sdk_s3::Client::complete_multipart_upload)
            .match_requests(|r| {
                let numbers: Vec<Option<i32>> = r
                    .multipart_upload()
                    .map(|mpu| mpu.parts().iter().map(|p| p.part_number()).collect())
                    .unwrap_or_default();
                r.upload_id() == Some("upload-1") && numbers == vec![Some(1), Some(2)]
            })
            .then_output(|| {
                CompleteMultipartUploadOutput::builder()
                    .e_tag("\"final-2\"")
                    .location("http://localhost/test-bucket/test-key")
                    .build()
            });
        let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&complete]);
        let backend = S3Backend::new(client);

        let resp = backend
            .complete_multipart_upload(CompleteMultipartUploadRequest {
                bucket: "test-bucket".to_owned(),
                key: "test-key".to_owned(),
                upload_id: "upload-1".to_owned(),
                parts: vec![
                    CompletedPart {
                        part_number: 1,
                        e_tag: "e1".to_owned(),
                    },
                    CompletedPart {
                        part_number: 2,
                        e_tag: "e2".to_owned(),
                    },
                ],
            })
            .await
            .unwrap();

        assert_eq!(Some("\"final-2\""), resp.e_tag.as_deref());
        assert_eq!(
            Some("http://localhost/test-bucket/test-key"),
            resp.location.as_deref()
        );
    }

    #[tokio::test]
    async fn test_bucket_exists() {
        let found = mock!(aws_sdk_s3::Client::head_bucket)
            .match_requests(|r| r.bucket() == Some("present"))
            .then_output(|| HeadBucketOutput::builder().build());
        let missing = mock!(aws_sdk_s3::Client::head_bucket)
            .match_requests(|r| r.bucket() == Some("absent"))
            .then_error(|| {
                HeadBucketError::NotFound(
                    NotFound::builder()
                        .meta(ErrorMetadata::builder().code("NotFound").build())
                        .build(),
                )
            });
        let client = mock_client!(aws_sdk_s3, RuleMode::MatchAny, &[&found, &missing]);
        let backend = S3Backend::new(client);

        assert!(backend.bucket_exists("present").await.unwrap());
        assert!(!backend.bucket_exists("absent").await.unwrap());
    }

    #[tokio::test]
    async fn test_stat_missing_object() {
        let head_object = mock!(aws_sdk_s3::Client::head_object).then_error(|| {
            HeadObjectError::NotFound(
                NotFound::builder()
                    .meta(ErrorMetadata::builder().code("NotFound").build())
                    .build(),
            )
        });
        let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&head_object]);
        let backend = S3Backend::new(client);

        let err = backend
            .stat_object(ObjectRequest {
                bucket: "test-bucket".to_owned(),
                key: "missing".to_owned(),
                version_id: None,
                ssec: None,
            })
            .await
            .unwrap_err();
        assert_eq!(&ErrorKind::NotFound, err.kind());
    }

    #[tokio::test]
    async fn test_list_objects_page() {
        let list = mock!(aws_sdk_s3::Client::list_objects_v2)
            .match_requests(|r| r.delimiter() == Some("/") && r.max_keys() == Some(1000))
            .then_output(|| {
                ListObjectsV2Output::builder()
                    .contents(Object::builder().key("a.txt").e_tag("\"e-a\"").size(3).build())
                    .common_prefixes(CommonPrefix::builder().prefix("dir/").build())
                    .is_truncated(true)
                    .next_continuation_token("next")
                    .build()
            });
        let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&list]);
        let backend = S3Backend::new(client);

        let page = backend
            .list_objects(ListObjectsRequest {
                bucket: "test-bucket".to_owned(),
                delimiter: Some("/".to_owned()),
                max_keys: 1000,
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(1, page.objects.len());
        assert_eq!("a.txt", page.objects[0].key);
        assert_eq!(Some("e-a"), page.objects[0].e_tag.as_deref());
        assert_eq!(Some(3), page.objects[0].size);
        assert_eq!(vec!["dir/".to_owned()], page.common_prefixes);
        assert_eq!(Some("next"), page.next_continuation_token.as_deref());
    }

    #[tokio::test]
    async fn test_service_error_kind() {
        let list = mock!(aws_sdk_s3::Client::list_buckets).then_error(|| {
            aws_sdk_s3::operation::list_buckets::ListBucketsError::generic(
                ErrorMetadata::builder().code("AccessDenied").build(),
            )
        });
        let head = mock!(aws_sdk_s3::Client::head_bucket).then_error(|| {
            HeadBucketError::generic(
                ErrorMetadata::builder().code("NoSuchBucket").build(),
            )
        });
        let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&list, &head]);
        let backend = S3Backend::new(client);

        let err = backend.list_buckets().await.unwrap_err();
        assert_eq!(&ErrorKind::ServiceError, err.kind());
        assert!(!backend.bucket_exists("gone").await.unwrap());
    }
}
