/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::backend::{ResponseHeaders, WriteResponse};
use crate::types::trim_e_tag;

/// Result of writing an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectWriteResult {
    bucket: String,
    key: String,
    version_id: Option<String>,
    e_tag: Option<String>,
    headers: ResponseHeaders,
    location: Option<String>,
    upload_id: Option<String>,
}

impl ObjectWriteResult {
    /// Assemble the result from the response to a single PUT or to multipart completion.
    pub(crate) fn from_response(
        bucket: impl Into<String>,
        key: impl Into<String>,
        upload_id: Option<String>,
        response: WriteResponse,
    ) -> Self {
        let e_tag = response
            .e_tag
            .as_deref()
            .or_else(|| response.headers.get("etag").map(String::as_str))
            .map(trim_e_tag);
        let version_id = response
            .version_id
            .or_else(|| response.headers.get("x-amz-version-id").cloned());

        ObjectWriteResult {
            bucket: bucket.into(),
            key: key.into(),
            version_id,
            e_tag,
            location: response.location,
            headers: response.headers,
            upload_id,
        }
    }

    /// The bucket name.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Object name.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Version ID of the object, if versioning is enabled on the bucket.
    pub fn version_id(&self) -> Option<&str> {
        self.version_id.as_deref()
    }

    /// Entity tag of the object, without surrounding quotes.
    pub fn e_tag(&self) -> Option<&str> {
        self.e_tag.as_deref()
    }

    /// Response headers.
    pub fn headers(&self) -> &ResponseHeaders {
        &self.headers
    }

    /// Location of the object, reported by multipart uploads.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// ID of the multipart upload that wrote the object, `None` for single-request uploads.
    pub fn upload_id(&self) -> Option<&str> {
        self.upload_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::ObjectWriteResult;
    use crate::backend::WriteResponse;

    #[test]
    fn test_e_tag_quotes_stripped() {
        let response = WriteResponse {
            e_tag: Some("\"abc-3\"".to_owned()),
            location: Some("http://localhost/b/k".to_owned()),
            ..Default::default()
        };
        let result = ObjectWriteResult::from_response("b", "k", Some("up-1".to_owned()), response);
        assert_eq!(Some("abc-3"), result.e_tag());
        assert_eq!(Some("http://localhost/b/k"), result.location());
        assert_eq!(Some("up-1"), result.upload_id());
        assert_eq!(None, result.version_id());
    }

    #[test]
    fn test_falls_back_to_headers() {
        let mut response = WriteResponse::default();
        response
            .headers
            .insert("etag".to_owned(), "\"from-header\"".to_owned());
        response
            .headers
            .insert("x-amz-version-id".to_owned(), "v7".to_owned());
        let result = ObjectWriteResult::from_response("b", "k", None, response);
        assert_eq!(Some("from-header"), result.e_tag());
        assert_eq!(Some("v7"), result.version_id());
        assert_eq!(None, result.location());
    }
}
