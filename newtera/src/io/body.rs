/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;
use std::io::Cursor;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};

use crate::error;

/// Streaming body of a downloaded object.
pub struct ObjectBody {
    inner: Pin<Box<dyn AsyncRead + Send + 'static>>,
}

impl ObjectBody {
    /// Wrap any reader as an object body
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + 'static,
    {
        Self {
            inner: Box::pin(reader),
        }
    }

    /// Read the remaining body into memory.
    pub async fn collect(mut self) -> Result<Bytes, error::Error> {
        let mut data = Vec::new();
        self.read_to_end(&mut data).await?;
        Ok(Bytes::from(data))
    }
}

impl AsyncRead for ObjectBody {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        self.inner.as_mut().poll_read(cx, buf)
    }
}

impl From<Bytes> for ObjectBody {
    fn from(value: Bytes) -> Self {
        Self::from_reader(Cursor::new(value))
    }
}

impl fmt::Debug for ObjectBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectBody(dyn AsyncRead)").finish()
    }
}
