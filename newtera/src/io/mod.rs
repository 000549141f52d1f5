/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

mod body;
pub(crate) mod part_reader;
mod progress;
mod stream;

// re-exports
pub use self::body::ObjectBody;
pub use self::progress::Progress;
pub(crate) use self::stream::BoxReader;
pub use self::stream::InputStream;
