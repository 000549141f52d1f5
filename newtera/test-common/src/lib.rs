/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Test helpers shared by the `newtera` integration tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use aws_smithy_types::DateTime;
use bytes::{Bytes, BytesMut};
use newtera::backend::{
    AbortMultipartUploadRequest, Backend, CompleteMultipartUploadRequest,
    CreateMultipartUploadRequest, GetObjectRequest, GetObjectResponse, ListObjectsPage,
    ListObjectsRequest, ObjectRequest, PutObjectRequest, UploadPartRequest, WriteResponse,
};
use newtera::error::{Error, ErrorKind};
use newtera::headers::ObjectHeaders;
use newtera::io::Progress;
use newtera::sse::{ServerSideEncryption, SseCustomerKey};
use newtera::types::{Bucket, ObjectInfo};

/// A request received by an [`InMemoryBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    PutObject { key: String, size: usize },
    CreateMultipartUpload { key: String },
    UploadPart { upload_id: String, part_number: i32, size: usize },
    CompleteMultipartUpload { upload_id: String, part_numbers: Vec<i32> },
    AbortMultipartUpload { upload_id: String },
}

/// An object stored by an [`InMemoryBackend`].
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Bytes,
    pub headers: ObjectHeaders,
    pub sse: Option<ServerSideEncryption>,
    pub e_tag: String,
}

impl StoredObject {
    /// Reject reads not carrying the customer key of an SSE-C object.
    fn check_customer_key(&self, ssec: Option<&SseCustomerKey>) -> Result<(), Error> {
        match self.sse.as_ref().and_then(ServerSideEncryption::customer_key) {
            Some(key) if ssec != Some(key) => Err(Error::new(
                ErrorKind::ServiceError,
                "InvalidRequest: the object was stored with SSE-C and needs the same key",
            )),
            _ => Ok(()),
        }
    }
}

#[derive(Debug)]
struct Upload {
    bucket: String,
    key: String,
    headers: ObjectHeaders,
    sse: Option<ServerSideEncryption>,
    parts: BTreeMap<i32, Bytes>,
}

#[derive(Debug, Default)]
struct State {
    buckets: BTreeMap<String, BTreeMap<String, StoredObject>>,
    uploads: HashMap<String, Upload>,
    next_upload_id: u64,
    calls: Vec<Call>,
}

#[derive(Debug, Default)]
struct Failures {
    parts: HashSet<i32>,
    part_delays: HashMap<i32, Duration>,
    abort: bool,
    complete: bool,
}

#[derive(Debug, Default)]
struct Inner {
    state: Mutex<State>,
    failures: Mutex<Failures>,
}

/// Storage backend keeping buckets and objects in memory.
///
/// Clones share their state, so a test can hand one clone to the client configuration
/// and inspect the recorded calls and stored objects through another. Failures and
/// delays can be injected per part.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    inner: Arc<Inner>,
}

impl InMemoryBackend {
    /// A backend with the given (empty) buckets.
    pub fn with_buckets(buckets: &[&str]) -> Self {
        let backend = Self::default();
        {
            let mut state = backend.state();
            for bucket in buckets {
                state.buckets.insert(bucket.to_string(), BTreeMap::new());
            }
        }
        backend
    }

    /// Fail every upload of part `part_number`.
    pub fn fail_part(self, part_number: i32) -> Self {
        self.failures().parts.insert(part_number);
        self
    }

    /// Delay the response to the upload of part `part_number`.
    pub fn delay_part(self, part_number: i32, delay: Duration) -> Self {
        self.failures().part_delays.insert(part_number, delay);
        self
    }

    /// Fail every request to abort a multipart upload.
    pub fn fail_abort(self) -> Self {
        self.failures().abort = true;
        self
    }

    /// Fail every request to complete a multipart upload.
    pub fn fail_complete(self) -> Self {
        self.failures().complete = true;
        self
    }

    /// Store an object directly.
    pub fn insert_object(&self, bucket: &str, key: &str, data: impl Into<Bytes>) {
        let data = data.into();
        let headers = ObjectHeaders::normalize(None, &HashMap::new()).expect("valid headers");
        let object = StoredObject {
            e_tag: e_tag(&data, None),
            data,
            headers,
            sse: None,
        };
        self.state()
            .buckets
            .entry(bucket.to_owned())
            .or_default()
            .insert(key.to_owned(), object);
    }

    /// All requests received so far, in the order they completed.
    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    /// Number of abort requests received.
    pub fn abort_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::AbortMultipartUpload { .. }))
            .count()
    }

    /// Number of multipart uploads neither completed nor aborted.
    pub fn pending_uploads(&self) -> usize {
        self.state().uploads.len()
    }

    /// A stored object.
    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.state()
            .buckets
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .cloned()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.inner.state.lock().unwrap()
    }

    fn failures(&self) -> std::sync::MutexGuard<'_, Failures> {
        self.inner.failures.lock().unwrap()
    }

    fn store(&self, bucket: &str, key: &str, object: StoredObject) -> Result<(), Error> {
        let mut state = self.state();
        let objects = state.buckets.get_mut(bucket).ok_or_else(|| no_such_bucket(bucket))?;
        objects.insert(key.to_owned(), object);
        Ok(())
    }

    fn find(&self, bucket: &str, key: &str) -> Result<StoredObject, Error> {
        let state = self.state();
        let objects = state.buckets.get(bucket).ok_or_else(|| no_such_bucket(bucket))?;
        objects.get(key).cloned().ok_or_else(|| {
            Error::new(
                ErrorKind::NotFound,
                format!("NoSuchKey: {bucket}/{key} does not exist"),
            )
        })
    }
}

#[async_trait]
impl Backend for InMemoryBackend {
    async fn put_object(&self, request: PutObjectRequest) -> Result<WriteResponse, Error> {
        self.state().calls.push(Call::PutObject {
            key: request.key.clone(),
            size: request.body.len(),
        });
        let e_tag = e_tag(&request.body, None);
        self.store(
            &request.bucket,
            &request.key,
            StoredObject {
                data: request.body,
                headers: request.headers,
                sse: request.sse,
                e_tag: e_tag.clone(),
            },
        )?;
        Ok(WriteResponse {
            e_tag: Some(format!("\"{e_tag}\"")),
            ..Default::default()
        })
    }

    async fn create_multipart_upload(
        &self,
        request: CreateMultipartUploadRequest,
    ) -> Result<String, Error> {
        let mut state = self.state();
        if !state.buckets.contains_key(&request.bucket) {
            return Err(no_such_bucket(&request.bucket));
        }
        state.next_upload_id += 1;
        let upload_id = format!("upload-{}", state.next_upload_id);
        state.calls.push(Call::CreateMultipartUpload {
            key: request.key.clone(),
        });
        state.uploads.insert(
            upload_id.clone(),
            Upload {
                bucket: request.bucket,
                key: request.key,
                headers: request.headers,
                sse: request.sse,
                parts: BTreeMap::new(),
            },
        );
        Ok(upload_id)
    }

    async fn upload_part(&self, request: UploadPartRequest) -> Result<String, Error> {
        let (delay, fail) = {
            let failures = self.failures();
            (
                failures.part_delays.get(&request.part_number).copied(),
                failures.parts.contains(&request.part_number),
            )
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state();
        state.calls.push(Call::UploadPart {
            upload_id: request.upload_id.clone(),
            part_number: request.part_number,
            size: request.body.len(),
        });
        if fail {
            return Err(Error::new(
                ErrorKind::ServiceError,
                format!("InternalError: injected failure of part {}", request.part_number),
            ));
        }
        let upload = state
            .uploads
            .get_mut(&request.upload_id)
            .ok_or_else(|| no_such_upload(&request.upload_id))?;
        if let Some(key) = upload.sse.as_ref().and_then(ServerSideEncryption::customer_key) {
            if request.extra_headers != key.headers() {
                return Err(Error::new(
                    ErrorKind::ServiceError,
                    format!(
                        "InvalidRequest: part {} was sent without the SSE-C key of the upload",
                        request.part_number
                    ),
                ));
            }
        }
        let e_tag = e_tag(&request.body, None);
        upload.parts.insert(request.part_number, request.body);
        Ok(format!("\"{e_tag}\""))
    }

    async fn complete_multipart_upload(
        &self,
        request: CompleteMultipartUploadRequest,
    ) -> Result<WriteResponse, Error> {
        let part_numbers: Vec<i32> = request.parts.iter().map(|p| p.part_number).collect();
        self.state().calls.push(Call::CompleteMultipartUpload {
            upload_id: request.upload_id.clone(),
            part_numbers: part_numbers.clone(),
        });
        if self.failures().complete {
            return Err(Error::new(
                ErrorKind::ServiceError,
                "InternalError: injected completion failure",
            ));
        }

        let upload = self
            .state()
            .uploads
            .remove(&request.upload_id)
            .ok_or_else(|| no_such_upload(&request.upload_id))?;
        let ordered = part_numbers.windows(2).all(|w| w[0] < w[1]);
        if !ordered || part_numbers.iter().any(|n| !upload.parts.contains_key(n)) {
            return Err(Error::new(
                ErrorKind::ServiceError,
                format!("InvalidPartOrder: {part_numbers:?}"),
            ));
        }

        let mut data = BytesMut::new();
        for part_number in &part_numbers {
            data.extend_from_slice(&upload.parts[part_number]);
        }
        let data = data.freeze();
        let e_tag = e_tag(&data, Some(part_numbers.len()));
        self.store(
            &upload.bucket,
            &upload.key,
            StoredObject {
                data,
                headers: upload.headers,
                sse: upload.sse,
                e_tag: e_tag.clone(),
            },
        )?;
        Ok(WriteResponse {
            e_tag: Some(format!("\"{e_tag}\"")),
            location: Some(format!("http://localhost/{}/{}", upload.bucket, upload.key)),
            ..Default::default()
        })
    }

    async fn abort_multipart_upload(
        &self,
        request: AbortMultipartUploadRequest,
    ) -> Result<(), Error> {
        let mut state = self.state();
        state.calls.push(Call::AbortMultipartUpload {
            upload_id: request.upload_id.clone(),
        });
        if self.failures().abort {
            return Err(Error::new(
                ErrorKind::ServiceError,
                "AccessDenied: injected abort failure",
            ));
        }
        state
            .uploads
            .remove(&request.upload_id)
            .map(|_| ())
            .ok_or_else(|| no_such_upload(&request.upload_id))
    }

    async fn list_buckets(&self) -> Result<Vec<Bucket>, Error> {
        Ok(self
            .state()
            .buckets
            .keys()
            .map(|name| Bucket {
                name: name.clone(),
                creation_date: Some(DateTime::from_secs(1_700_000_000)),
            })
            .collect())
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool, Error> {
        Ok(self.state().buckets.contains_key(bucket))
    }

    async fn stat_object(&self, request: ObjectRequest) -> Result<ObjectInfo, Error> {
        let object = self.find(&request.bucket, &request.key)?;
        object.check_customer_key(request.ssec.as_ref())?;
        Ok(object_info(&request.bucket, &request.key, &object))
    }

    async fn get_object(&self, request: GetObjectRequest) -> Result<GetObjectResponse, Error> {
        let object = self.find(&request.bucket, &request.key)?;
        object.check_customer_key(request.ssec.as_ref())?;
        let mut info = object_info(&request.bucket, &request.key, &object);
        let len = object.data.len() as u64;
        let data = match request.range {
            None => object.data,
            Some(range) if range.offset >= len && len > 0 => {
                return Err(Error::new(
                    ErrorKind::ServiceError,
                    format!("InvalidRange: offset {} of {len} bytes", range.offset),
                ))
            }
            Some(range) => {
                let start = range.offset.min(len);
                let end = match range.length.filter(|length| *length > 0) {
                    Some(length) => start.saturating_add(length).min(len),
                    None => len,
                };
                object.data.slice(start as usize..end as usize)
            }
        };
        info.size = Some(data.len() as u64);
        Ok(GetObjectResponse {
            info,
            body: data.into(),
        })
    }

    async fn remove_object(&self, request: ObjectRequest) -> Result<(), Error> {
        let mut state = self.state();
        let objects = state
            .buckets
            .get_mut(&request.bucket)
            .ok_or_else(|| no_such_bucket(&request.bucket))?;
        objects.remove(&request.key);
        Ok(())
    }

    async fn list_objects(&self, request: ListObjectsRequest) -> Result<ListObjectsPage, Error> {
        enum Entry {
            Object(String, ObjectInfo),
            Prefix(String, String),
        }

        let state = self.state();
        let objects = state
            .buckets
            .get(&request.bucket)
            .ok_or_else(|| no_such_bucket(&request.bucket))?;
        let prefix = request.prefix.unwrap_or_default();
        let after = request.continuation_token.or(request.start_after);

        let mut entries: Vec<Entry> = Vec::new();
        for (key, object) in objects {
            if !key.starts_with(&prefix) || after.as_ref().is_some_and(|after| key <= after) {
                continue;
            }
            let common_prefix = request.delimiter.as_deref().and_then(|delimiter| {
                let rest = &key[prefix.len()..];
                rest.find(delimiter)
                    .map(|i| format!("{prefix}{}", &rest[..i + delimiter.len()]))
            });
            match common_prefix {
                Some(common_prefix) => match entries.last_mut() {
                    Some(Entry::Prefix(last, last_key)) if *last == common_prefix => {
                        *last_key = key.clone();
                    }
                    _ => entries.push(Entry::Prefix(common_prefix, key.clone())),
                },
                None => entries.push(Entry::Object(
                    key.clone(),
                    object_info(&request.bucket, key, object),
                )),
            }
        }

        let max_keys = request.max_keys.max(1) as usize;
        let truncated = entries.len() > max_keys;
        entries.truncate(max_keys);

        let mut page = ListObjectsPage::default();
        for entry in entries {
            let last_key = match entry {
                Entry::Object(key, info) => {
                    page.objects.push(info);
                    key
                }
                Entry::Prefix(common_prefix, last_key) => {
                    page.common_prefixes.push(common_prefix);
                    last_key
                }
            };
            if truncated {
                page.next_continuation_token = Some(last_key);
            }
        }
        Ok(page)
    }
}

fn object_info(bucket: &str, key: &str, object: &StoredObject) -> ObjectInfo {
    ObjectInfo {
        bucket: bucket.to_owned(),
        key: key.to_owned(),
        last_modified: Some(DateTime::from_secs(1_700_000_000)),
        e_tag: Some(object.e_tag.clone()),
        size: Some(object.data.len() as u64),
        content_type: Some(object.headers.content_type.clone()),
        metadata: object.headers.metadata.clone(),
        ..Default::default()
    }
}

/// FNV-1a digest of the data, suffixed with the part count for multipart objects.
fn e_tag(data: &[u8], parts: Option<usize>) -> String {
    let hash = data.iter().fold(0xcbf29ce484222325u64, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(0x100000001b3)
    });
    let mut e_tag = format!("{hash:016x}");
    if let Some(parts) = parts {
        let _ = write!(e_tag, "-{parts}");
    }
    e_tag
}

fn no_such_bucket(bucket: &str) -> Error {
    Error::new(
        ErrorKind::NotFound,
        format!("NoSuchBucket: bucket {bucket} does not exist"),
    )
}

fn no_such_upload(upload_id: &str) -> Error {
    Error::new(
        ErrorKind::NotFound,
        format!("NoSuchUpload: upload {upload_id} does not exist"),
    )
}

/// Progress receiver recording what it is told.
#[derive(Debug, Clone, Default)]
pub struct RecordingProgress {
    meta: Arc<Mutex<Option<(String, Option<u64>)>>>,
    total: Arc<AtomicU64>,
}

impl RecordingProgress {
    /// Object name and total length given to `set_meta`.
    pub fn meta(&self) -> Option<(String, Option<u64>)> {
        self.meta.lock().unwrap().clone()
    }

    /// Sum of all updates.
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::SeqCst)
    }
}

impl Progress for RecordingProgress {
    fn set_meta(&self, object_name: &str, total_length: Option<u64>) {
        *self.meta.lock().unwrap() = Some((object_name.to_owned(), total_length));
    }

    fn update(&self, length: u64) {
        self.total.fetch_add(length, Ordering::SeqCst);
    }
}
