/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::{BTreeMap, HashMap};

use crate::error;

/// Content type used when none is given
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

const USER_METADATA_PREFIX: &str = "x-amz-meta-";

/// Headers sent when an object is written.
///
/// Built from a content type and a flat map of user supplied metadata:
///
/// * standard content headers (`Cache-Control`, `Content-Encoding`, `Content-Disposition`,
///   `Content-Language`, `Content-Type`) are sent as-is,
/// * `x-amz-meta-*` keys and keys without an `x-amz-` prefix become user metadata,
/// * any other `x-amz-*` key is passed through in [`extra`](ObjectHeaders::extra).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectHeaders {
    /// `Content-Type`
    pub content_type: String,
    /// `Cache-Control`
    pub cache_control: Option<String>,
    /// `Content-Encoding`
    pub content_encoding: Option<String>,
    /// `Content-Disposition`
    pub content_disposition: Option<String>,
    /// `Content-Language`
    pub content_language: Option<String>,
    /// User metadata keyed without the `x-amz-meta-` prefix
    pub metadata: HashMap<String, String>,
    /// Other `x-amz-*` headers, keyed in lower case
    pub extra: BTreeMap<String, String>,
}

impl Default for ObjectHeaders {
    fn default() -> Self {
        ObjectHeaders {
            content_type: DEFAULT_CONTENT_TYPE.to_owned(),
            cache_control: None,
            content_encoding: None,
            content_disposition: None,
            content_language: None,
            metadata: HashMap::new(),
            extra: BTreeMap::new(),
        }
    }
}

impl ObjectHeaders {
    /// Normalize a content type and user metadata into request headers.
    ///
    /// Fails with [`InputInvalid`](crate::error::ErrorKind::InputInvalid) for empty keys and
    /// for keys or values that are not US-ASCII.
    pub fn normalize<'a, I>(content_type: Option<&str>, metadata: I) -> Result<Self, error::Error>
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut headers = ObjectHeaders::default();

        for (key, value) in metadata {
            if key.is_empty() {
                return Err(error::invalid_input("metadata key must not be empty"));
            }
            if !key.is_ascii() {
                return Err(error::invalid_input(format!(
                    "unsupported metadata key {key:?}; only US-ASCII is allowed"
                )));
            }
            if !value.is_ascii() {
                return Err(error::invalid_input(format!(
                    "unsupported metadata value {value:?} for {key}; only US-ASCII is allowed"
                )));
            }

            let lower = key.to_ascii_lowercase();
            let value = value.to_owned();
            match lower.as_str() {
                "content-type" => headers.content_type = value,
                "cache-control" => headers.cache_control = Some(value),
                "content-encoding" => headers.content_encoding = Some(value),
                "content-disposition" => headers.content_disposition = Some(value),
                "content-language" => headers.content_language = Some(value),
                _ if lower.starts_with(USER_METADATA_PREFIX) => {
                    headers
                        .metadata
                        .insert(key[USER_METADATA_PREFIX.len()..].to_owned(), value);
                }
                _ if lower.starts_with("x-amz-") => {
                    headers.extra.insert(lower, value);
                }
                _ => {
                    headers.metadata.insert(key.to_owned(), value);
                }
            }
        }

        if let Some(content_type) = content_type {
            if !content_type.is_ascii() {
                return Err(error::invalid_input(format!(
                    "unsupported content type {content_type:?}; only US-ASCII is allowed"
                )));
            }
            headers.content_type = content_type.to_owned();
        }

        Ok(headers)
    }
}
