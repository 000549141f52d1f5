/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::Instrument;

use crate::backend::{GetObjectRequest, ObjectRequest};
use crate::error::{self, Error};
use crate::io::Progress;
use crate::operation::stat_object::object_request;
use crate::sse::SseCustomerKey;
use crate::types::ObjectInfo;
use crate::MEBIBYTE;

const TEMP_FILE_SUFFIX: &str = "part.newtera";

/// Fluent builder for downloading an object into a file
#[derive(Debug)]
pub struct FGetObjectFluentBuilder {
    handle: Arc<crate::client::Handle>,
    bucket: Option<String>,
    key: Option<String>,
    version_id: Option<String>,
    path: Option<PathBuf>,
    progress: Option<Arc<dyn Progress>>,
    ssec: Option<SseCustomerKey>,
}

impl FGetObjectFluentBuilder {
    pub(crate) fn new(handle: Arc<crate::client::Handle>) -> Self {
        Self {
            handle,
            bucket: None,
            key: None,
            version_id: None,
            path: None,
            progress: None,
            ssec: None,
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

    /// Version of the object.
    pub fn version_id(mut self, input: impl Into<String>) -> Self {
        self.version_id = Some(input.into());
        self
    }

    /// Key the object was encrypted with, required for SSE-C objects.
    pub fn ssec(mut self, input: SseCustomerKey) -> Self {
        self.ssec = Some(input);
        self
    }

    /// File to download to. Missing parent directories are created. This field is required.
    pub fn path(mut self, input: impl AsRef<Path>) -> Self {
        self.path = Some(input.as_ref().to_path_buf());
        self
    }

    /// Receiver of progress notifications.
    pub fn progress(mut self, input: impl Progress + 'static) -> Self {
        self.progress = Some(Arc::new(input));
        self
    }

    /// Download the object, returning its information.
    ///
    /// An existing file at the destination is replaced once the download has completed.
    #[tracing::instrument(skip_all, level = "debug", name = "fget-object")]
    pub async fn send(self) -> Result<ObjectInfo, Error> {
        let object = ObjectRequest {
            ssec: self.ssec,
            ..object_request(self.bucket, self.key, self.version_id)?
        };
        let path = self
            .path
            .ok_or_else(|| error::invalid_input("a destination path is required"))?;
        if tokio::fs::metadata(&path)
            .await
            .is_ok_and(|meta| meta.is_dir())
        {
            return Err(error::invalid_input(format!(
                "file {} is a directory",
                path.display()
            )));
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let backend = self.handle.config.backend();
        let info = backend
            .stat_object(object.clone())
            .instrument(tracing::debug_span!("send-head-object"))
            .await?;

        let temp_path = temp_file_path(&path, info.e_tag.as_deref().unwrap_or_default());
        let response = backend
            .get_object(GetObjectRequest {
                bucket: object.bucket,
                key: object.key,
                version_id: object.version_id,
                range: None,
                ssec: object.ssec,
            })
            .instrument(tracing::debug_span!("send-get-object"))
            .await?;

        if let Some(progress) = &self.progress {
            progress.set_meta(&info.key, response.info.size);
        }

        let mut body = response.body;
        let mut file = tokio::fs::File::create(&temp_path).await?;
        let mut buf = vec![0u8; MEBIBYTE as usize];
        loop {
            let n = body.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            file.write_all(&buf[..n]).await?;
            if let Some(progress) = &self.progress {
                progress.update(n as u64);
            }
        }
        file.flush().await?;
        drop(file);

        if tokio::fs::try_exists(&path).await? {
            tokio::fs::remove_file(&path).await?;
        }
        tokio::fs::rename(&temp_path, &path).await?;
        tracing::debug!("downloaded {} to {}", info.key, path.display());
        Ok(info)
    }
}

/// `<path>.<etag>.part.newtera`, with the etag percent-encoded.
fn temp_file_path(path: &Path, e_tag: &str) -> PathBuf {
    let mut temp = OsString::from(path.as_os_str());
    temp.push(format!(".{}.{TEMP_FILE_SUFFIX}", encode_component(e_tag)));
    PathBuf::from(temp)
}

fn encode_component(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_file_path() {
        let path = temp_file_path(Path::new("/tmp/data/out.bin"), "abc123-2");
        assert_eq!(
            Path::new("/tmp/data/out.bin.abc123-2.part.newtera"),
            path.as_path()
        );

        let path = temp_file_path(Path::new("out.bin"), "a/b c");
        assert_eq!(Path::new("out.bin.a%2Fb%20c.part.newtera"), path.as_path());
    }
}
