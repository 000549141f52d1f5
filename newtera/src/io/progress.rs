/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt::Debug;

/// Receives progress notifications while an object is uploaded.
///
/// Implementations must be cheap; [`update`](Progress::update) is called from the read
/// loop for every chunk pulled from the source stream.
pub trait Progress: Send + Sync + Debug {
    /// Called once before any data is read.
    ///
    /// `total_length` is `None` for streams of unknown length.
    fn set_meta(&self, object_name: &str, total_length: Option<u64>);

    /// Called with the number of bytes read from the source stream since the last update.
    fn update(&self, length: u64);
}
