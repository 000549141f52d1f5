/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::error;
use crate::MEBIBYTE;

/// Minimum size of every part except the last
pub const MIN_PART_SIZE: u64 = 5 * MEBIBYTE;

/// Maximum size of a single part
pub const MAX_PART_SIZE: u64 = 5 * 1024 * MEBIBYTE;

/// Maximum size of an object uploaded with a multipart upload
pub const MAX_MULTIPART_OBJECT_SIZE: u64 = 5 * 1024 * 1024 * MEBIBYTE;

/// Maximum number of parts in a single multipart upload
pub const MAX_MULTIPART_COUNT: u64 = 10_000;

/// How an object is split into parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct UploadPlan {
    part_size: u64,
    part_count: Option<u32>,
}

impl UploadPlan {
    /// Compute the part geometry for an object.
    ///
    /// `object_size` is `None` for streams of unknown length and `requested_part_size`
    /// is `0` to have the part size derived from the object size.
    pub(crate) fn compute(
        object_size: Option<u64>,
        requested_part_size: u64,
    ) -> Result<UploadPlan, error::Error> {
        if requested_part_size > 0 {
            if requested_part_size < MIN_PART_SIZE {
                return Err(error::invalid_input(format!(
                    "part size {requested_part_size} is less than the minimum of {MIN_PART_SIZE} bytes"
                )));
            }
            if requested_part_size > MAX_PART_SIZE {
                return Err(error::invalid_input(format!(
                    "part size {requested_part_size} is greater than the maximum of {MAX_PART_SIZE} bytes"
                )));
            }
        }

        let object_size = match object_size {
            Some(object_size) => object_size,
            None if requested_part_size == 0 => {
                return Err(error::invalid_input(
                    "a valid part size must be provided when the object size is unknown",
                ));
            }
            None => {
                return Ok(UploadPlan {
                    part_size: requested_part_size,
                    part_count: None,
                })
            }
        };

        if object_size > MAX_MULTIPART_OBJECT_SIZE {
            return Err(error::invalid_input(format!(
                "object size {object_size} is greater than the maximum of {MAX_MULTIPART_OBJECT_SIZE} bytes"
            )));
        }

        let part_size = if requested_part_size > 0 {
            requested_part_size.min(object_size)
        } else {
            object_size
                .div_ceil(MAX_MULTIPART_COUNT)
                .div_ceil(MIN_PART_SIZE)
                * MIN_PART_SIZE
        };

        let part_count = if part_size > 0 {
            object_size.div_ceil(part_size)
        } else {
            1
        };
        if part_count > MAX_MULTIPART_COUNT {
            return Err(error::invalid_input(format!(
                "part size {part_size} for object size {object_size} results in {part_count} parts, \
                 more than the maximum of {MAX_MULTIPART_COUNT}"
            )));
        }

        Ok(UploadPlan {
            part_size,
            // bounded by MAX_MULTIPART_COUNT above
            part_count: Some(part_count as u32),
        })
    }

    /// Size of every part except possibly the last
    pub(crate) fn part_size(&self) -> u64 {
        self.part_size
    }

    /// Number of parts, `None` when it is only known once the stream ends
    pub(crate) fn part_count(&self) -> Option<u32> {
        self.part_count
    }
}
