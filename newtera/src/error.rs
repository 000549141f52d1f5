/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;

use aws_sdk_s3::error::ProvideErrorMetadata;

/// A boxed error that is `Send` and `Sync`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by this library
///
/// NOTE: Use [`aws_smithy_types::error::display::DisplayErrorContext`] or similar to display
/// the entire error cause/source chain.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    source: BoxError,
    abort_failure: Option<Box<Error>>,
}

/// General categories of client errors.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Operation input validation issues (part size, names, metadata, endpoint)
    InputInvalid,

    /// I/O errors
    IOError,

    /// The source stream ended before a part of known size could be filled
    TruncatedStream,

    /// Failed to upload a part of a multipart upload
    PartUploadFailed(PartUploadFailed),

    /// Completing a multipart upload failed after every part was uploaded
    CompletionFailed,

    /// Aborting a multipart upload failed
    AbortFailed,

    /// Resource not found (e.g. bucket, key, multipart upload ID not found)
    NotFound,

    /// The storage service rejected a request
    ServiceError,

    /// A response or an assembled request did not have the expected shape
    ValidationFailed,

    /// Some kind of internal runtime issue (e.g. task failure, closed channel, etc)
    RuntimeError,
}

/// Stores information about a failed part upload
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PartUploadFailed {
    part_number: i32,
}

impl PartUploadFailed {
    /// The 1-based number of the part that failed to upload
    pub fn part_number(&self) -> i32 {
        self.part_number
    }
}

impl Error {
    /// Creates a new [`Error`] from a known kind of error as well as an arbitrary error
    /// source.
    pub fn new<E>(kind: ErrorKind, err: E) -> Error
    where
        E: Into<BoxError>,
    {
        Error {
            kind,
            source: err.into(),
            abort_failure: None,
        }
    }

    /// Returns the corresponding [`ErrorKind`] for this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// The error raised while aborting the multipart upload after this error occurred, if any.
    ///
    /// An abort failure never replaces the error that caused the abort.
    pub fn abort_failure(&self) -> Option<&Error> {
        self.abort_failure.as_deref()
    }

    pub(crate) fn with_abort_failure(mut self, abort_failure: Error) -> Error {
        self.abort_failure = Some(Box::new(abort_failure));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::InputInvalid => write!(f, "invalid input"),
            ErrorKind::IOError => write!(f, "I/O error"),
            ErrorKind::TruncatedStream => write!(f, "source stream truncated"),
            ErrorKind::PartUploadFailed(failed) => {
                write!(f, "failed to upload part {}", failed.part_number)
            }
            ErrorKind::CompletionFailed => write!(f, "failed to complete multipart upload"),
            ErrorKind::AbortFailed => write!(f, "failed to abort multipart upload"),
            ErrorKind::NotFound => write!(f, "resource not found"),
            ErrorKind::ServiceError => write!(f, "service error"),
            ErrorKind::ValidationFailed => write!(f, "validation failed"),
            ErrorKind::RuntimeError => write!(f, "runtime error"),
        }?;
        if self.abort_failure.is_some() {
            write!(f, " (abort of the multipart upload also failed)")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::new(ErrorKind::IOError, value)
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::new(ErrorKind::RuntimeError, value)
    }
}

impl From<aws_smithy_types::error::operation::BuildError> for Error {
    fn from(value: aws_smithy_types::error::operation::BuildError) -> Self {
        Self::new(ErrorKind::InputInvalid, value)
    }
}

impl<E, R> From<aws_sdk_s3::error::SdkError<E, R>> for Error
where
    E: std::error::Error + ProvideErrorMetadata + Send + Sync + 'static,
    R: Send + Sync + fmt::Debug + 'static,
{
    fn from(value: aws_sdk_s3::error::SdkError<E, R>) -> Self {
        let kind = match value.code() {
            Some("NotFound" | "NoSuchKey" | "NoSuchUpload" | "NoSuchBucket") => ErrorKind::NotFound,
            _ => ErrorKind::ServiceError,
        };

        Error::new(kind, value)
    }
}

pub(crate) fn invalid_input<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::InputInvalid, err)
}

pub(crate) fn truncated_stream(expected: u64, actual: u64) -> Error {
    Error::new(
        ErrorKind::TruncatedStream,
        format!("stream having not enough data; expected: {expected}, got: {actual} bytes"),
    )
}

pub(crate) fn part_upload_failed<E>(part_number: i32, err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(
        ErrorKind::PartUploadFailed(PartUploadFailed { part_number }),
        err,
    )
}

pub(crate) fn completion_failed<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::CompletionFailed, err)
}

pub(crate) fn abort_failed<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::AbortFailed, err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_abort_failure_is_secondary() {
        let err = part_upload_failed(2, "connection reset")
            .with_abort_failure(Error::new(ErrorKind::AbortFailed, "access denied"));

        assert_eq!(
            &ErrorKind::PartUploadFailed(PartUploadFailed { part_number: 2 }),
            err.kind()
        );
        assert_eq!(
            &ErrorKind::AbortFailed,
            err.abort_failure().expect("abort failure").kind()
        );
        assert_eq!("connection reset", err.source().unwrap().to_string());
        assert!(err.to_string().starts_with("failed to upload part 2"));
    }

    #[test]
    fn test_truncated_stream_message() {
        let err = truncated_stream(10, 4);
        assert_eq!(&ErrorKind::TruncatedStream, err.kind());
        assert_eq!(
            "stream having not enough data; expected: 10, got: 4 bytes",
            err.source().unwrap().to_string()
        );
    }
}
