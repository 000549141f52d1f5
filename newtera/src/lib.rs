/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/* Automatically managed default lints */
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
/* End of automatically managed default lints */

//! Newtera TDM client
//!
//! A client for the S3-compatible object storage API of a Newtera TDM server. Objects of
//! any size are uploaded with [`Client::put_object`]: small objects with a single request,
//! larger objects and streams of unknown length as a multipart upload whose parts are
//! optionally uploaded in parallel.
//!
//! ```no_run
//! # async fn example() -> Result<(), newtera::error::Error> {
//! use newtera::config::loader::ConfigLoader;
//! use newtera::io::InputStream;
//!
//! let config = ConfigLoader::default()
//!     .endpoint("localhost:9000")
//!     .secure(false)
//!     .credentials("access-key", "secret-key")
//!     .load()
//!     .await?;
//! let client = newtera::Client::new(config);
//!
//! let result = client
//!     .put_object()
//!     .bucket("my-bucket")
//!     .key("my-object")
//!     .body(InputStream::from_path("data.bin")?)
//!     .send()
//!     .await?;
//! println!("uploaded {} with etag {:?}", result.key(), result.e_tag());
//! # Ok(())
//! # }
//! ```

#![warn(
    missing_debug_implementations,
    missing_docs,
    rustdoc::missing_crate_level_docs,
    unreachable_pub,
    rust_2018_idioms
)]

pub(crate) const MEBIBYTE: u64 = 1024 * 1024;

pub(crate) const DEFAULT_PARALLEL_UPLOADS: usize = 3;

/// Error types emitted by `newtera`
pub mod error;

/// Common types used by `newtera`
pub mod types;

/// Types and helpers for I/O
pub mod io;

/// Object write headers
pub mod headers;

/// Server-side encryption
pub mod sse;

pub mod backend;

/// Newtera client
pub mod client;

/// Newtera client configuration
pub mod config;

/// Client operations
pub mod operation;

mod validate;

pub use self::client::Client;
pub use self::config::Config;
