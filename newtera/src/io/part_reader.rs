/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error;
use crate::io::Progress;
use crate::operation::put_object::part_size::{UploadPlan, MAX_MULTIPART_COUNT};

/// Read from `reader` until `size` bytes are accumulated or the reader is exhausted.
///
/// `carry` is a byte left over from the previous read and becomes the first byte of the
/// result. Progress is reported for every chunk read from `reader`, not for `carry`.
pub(crate) async fn read_part_data<R>(
    reader: &mut R,
    size: usize,
    carry: Option<u8>,
    progress: Option<&dyn Progress>,
) -> std::io::Result<Bytes>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buf = vec![0u8; size];
    let mut filled = 0;
    if let Some(byte) = carry.filter(|_| size > 0) {
        buf[0] = byte;
        filled = 1;
    }

    while filled < size {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
        if let Some(progress) = progress {
            progress.update(n as u64);
        }
    }

    buf.truncate(filled);
    Ok(Bytes::from(buf))
}

/// Outcome of reading a single part from the source stream.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum PartRead {
    /// A full part; more data follows.
    More(Bytes),
    /// The final part of the stream.
    End(Bytes),
    /// The stream ended before a part of known size could be filled.
    Truncated { expected: u64, actual: u64 },
}

/// Contents of a single part of a multipart upload.
#[derive(Debug, Clone)]
pub(crate) struct PartData {
    // 1-indexed
    pub(crate) part_number: i32,
    pub(crate) data: Bytes,
    pub(crate) is_last: bool,
}

/// Splits a source stream into parts according to an [`UploadPlan`].
///
/// Streams of known length are read in exactly sized parts. Streams of unknown length are
/// read one byte past the part boundary; the extra byte signals more data and is carried
/// into the next part.
#[derive(Debug)]
pub(crate) struct PartReader<R> {
    reader: R,
    plan: UploadPlan,
    object_size: Option<u64>,
    next_part_number: i32,
    bytes_read: u64,
    carry: Option<u8>,
    finished: bool,
    progress: Option<Arc<dyn Progress>>,
}

impl<R> PartReader<R>
where
    R: AsyncRead + Unpin,
{
    pub(crate) fn new(reader: R, plan: UploadPlan, object_size: Option<u64>) -> Self {
        Self {
            reader,
            plan,
            object_size,
            next_part_number: 1,
            bytes_read: 0,
            carry: None,
            finished: false,
            progress: None,
        }
    }

    /// Report bytes read from the source stream to `progress`.
    pub(crate) fn with_progress(mut self, progress: Option<Arc<dyn Progress>>) -> Self {
        self.progress = progress;
        self
    }

    /// Read the next part, or `None` once the final part has been returned.
    pub(crate) async fn next_part(&mut self) -> Result<Option<PartData>, error::Error> {
        if self.finished {
            return Ok(None);
        }

        let part_number = self.next_part_number;
        if part_number as u64 > MAX_MULTIPART_COUNT {
            self.finished = true;
            return Err(error::invalid_input(format!(
                "stream requires more than {MAX_MULTIPART_COUNT} parts of {} bytes",
                self.plan.part_size()
            )));
        }

        let (data, is_last) = match self.read_part().await? {
            PartRead::More(data) => (data, false),
            PartRead::End(data) => {
                self.finished = true;
                (data, true)
            }
            PartRead::Truncated { expected, actual } => {
                self.finished = true;
                return Err(error::truncated_stream(expected, actual));
            }
        };

        self.next_part_number += 1;
        self.bytes_read += data.len() as u64;
        tracing::trace!(
            "read part {part_number} ({} bytes, last: {is_last})",
            data.len()
        );
        Ok(Some(PartData {
            part_number,
            data,
            is_last,
        }))
    }

    async fn read_part(&mut self) -> Result<PartRead, error::Error> {
        let part_size = self.plan.part_size();
        let progress = self.progress.as_deref();

        match (self.object_size, self.plan.part_count()) {
            (Some(object_size), Some(part_count)) => {
                let expected = part_size.min(object_size - self.bytes_read);
                let data =
                    read_part_data(&mut self.reader, to_usize(expected)?, None, progress).await?;
                if (data.len() as u64) < expected {
                    Ok(PartRead::Truncated {
                        expected,
                        actual: data.len() as u64,
                    })
                } else if self.next_part_number as u32 >= part_count {
                    Ok(PartRead::End(data))
                } else {
                    Ok(PartRead::More(data))
                }
            }
            _ => {
                let lookahead = to_usize(part_size + 1)?;
                let carry = self.carry.take();
                let mut data =
                    read_part_data(&mut self.reader, lookahead, carry, progress).await?;
                if data.len() < lookahead {
                    return Ok(PartRead::End(data));
                }
                self.carry = data.last().copied();
                data.truncate(lookahead - 1);
                Ok(PartRead::More(data))
            }
        }
    }
}

fn to_usize(size: u64) -> Result<usize, error::Error> {
    usize::try_from(size)
        .map_err(|_| error::invalid_input(format!("part size {size} exceeds addressable memory")))
}
