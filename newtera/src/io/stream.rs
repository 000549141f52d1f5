/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use bytes::Bytes;
use tokio::io::AsyncRead;

use crate::error;

/// Source of binary data.
///
/// `InputStream` wraps a stream of data for ease of use. The length of the data is either
/// known up front (in-memory buffers, files, readers with a declared length) or discovered
/// while reading.
#[derive(Debug)]
pub struct InputStream {
    pub(super) inner: RawInputStream,
}

impl InputStream {
    /// Create a new `InputStream` from a static byte slice
    pub fn from_static(bytes: &'static [u8]) -> Self {
        let inner = RawInputStream::Buf(bytes.into());
        Self { inner }
    }

    /// Create a new `InputStream` that reads data from a given `path`.
    ///
    /// The length of the file is read once, here. The contents of the file MUST NOT change
    /// while it is uploaded.
    ///
    /// # Examples
    /// ```no_run
    /// use newtera::io::InputStream;
    ///  async fn make_stream() -> InputStream {
    ///     InputStream::from_path("docs/rows.csv").expect("file should be readable")
    /// }
    /// ```
    pub fn from_path(path: impl AsRef<Path>) -> Result<InputStream, error::Error> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(error::invalid_input(format!(
                "{} is not a file",
                path.display()
            )));
        }
        let inner = RawInputStream::Fs(PathBody {
            path: path.to_path_buf(),
            length: metadata.len(),
        });
        Ok(Self { inner })
    }

    /// Create a new `InputStream` that reads data from any [`AsyncRead`] implementation.
    ///
    /// `length` is the number of bytes the reader will yield, or `None` when unknown.
    /// Uploads of unknown length require an explicit part size.
    pub fn from_reader<R>(reader: R, length: Option<u64>) -> Self
    where
        R: AsyncRead + Send + 'static,
    {
        let inner = RawInputStream::Dyn(BoxReader(Box::pin(reader)), length);
        Self { inner }
    }

    /// The total number of bytes in this stream, if known
    pub fn content_length(&self) -> Option<u64> {
        match &self.inner {
            RawInputStream::Buf(bytes) => Some(bytes.len() as u64),
            RawInputStream::Fs(path_body) => Some(path_body.length),
            RawInputStream::Dyn(_, length) => *length,
        }
    }

    /// Convert into a reader yielding the stream's bytes in order.
    pub(crate) async fn into_reader(self) -> Result<BoxReader, error::Error> {
        let reader = match self.inner {
            RawInputStream::Buf(bytes) => BoxReader(Box::pin(Cursor::new(bytes))),
            RawInputStream::Fs(path_body) => {
                let file = tokio::fs::File::open(&path_body.path).await?;
                BoxReader(Box::pin(file))
            }
            RawInputStream::Dyn(reader, _) => reader,
        };
        Ok(reader)
    }
}

#[derive(Debug)]
pub(super) enum RawInputStream {
    /// In-memory buffer to read from
    Buf(Bytes),
    /// File based input
    Fs(PathBody),
    /// User provided reader and its declared length
    Dyn(BoxReader, Option<u64>),
}

#[derive(Debug)]
pub(super) struct PathBody {
    path: PathBuf,
    length: u64,
}

/// Type erased reader
pub(crate) struct BoxReader(Pin<Box<dyn AsyncRead + Send + 'static>>);

impl AsyncRead for BoxReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
        buf: &mut tokio::io::ReadBuf<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        self.0.as_mut().poll_read(cx, buf)
    }
}

impl fmt::Debug for BoxReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxReader(dyn AsyncRead)").finish()
    }
}

impl Default for InputStream {
    fn default() -> Self {
        Self {
            inner: RawInputStream::Buf(Bytes::default()),
        }
    }
}

impl From<Bytes> for InputStream {
    fn from(value: Bytes) -> Self {
        Self {
            inner: RawInputStream::Buf(value),
        }
    }
}

impl From<Vec<u8>> for InputStream {
    fn from(value: Vec<u8>) -> Self {
        Self::from(Bytes::from(value))
    }
}

impl From<&'static [u8]> for InputStream {
    fn from(slice: &'static [u8]) -> InputStream {
        Self::from(Bytes::from_static(slice))
    }
}

impl From<&'static str> for InputStream {
    fn from(slice: &'static str) -> InputStream {
        Self::from(Bytes::from_static(slice.as_bytes()))
    }
}

#[cfg(test)]
mod test {
    use super::InputStream;
    use crate::error::ErrorKind;
    use bytes::Bytes;
    use std::io::Write;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_from_path() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"hello world").unwrap();

        let stream = InputStream::from_path(tmp.path()).unwrap();
        assert_eq!(Some(11), stream.content_length());

        let mut reader = stream.into_reader().await.unwrap();
        let mut data = Vec::new();
        reader.read_to_end(&mut data).await.unwrap();
        assert_eq!(b"hello world".as_slice(), data.as_slice());
    }

    #[test]
    fn test_from_path_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = InputStream::from_path(dir.path()).unwrap_err();
        assert_eq!(&ErrorKind::InputInvalid, err.kind());
    }

    #[test]
    fn test_content_length() {
        assert_eq!(Some(3), InputStream::from(Bytes::from_static(b"abc")).content_length());
        assert_eq!(Some(0), InputStream::default().content_length());
        let reader = std::io::Cursor::new(vec![0u8; 10]);
        assert_eq!(None, InputStream::from_reader(reader, None).content_length());
    }
}
