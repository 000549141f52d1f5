/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::net::Ipv4Addr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error;

static BUCKET_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[a-z0-9][a-z0-9_.\-:]{1,61}[a-z0-9]$").expect("valid bucket name regex")
});

static STRICT_BUCKET_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9.\-]{1,61}[a-z0-9]$").expect("valid regex"));

/// Check a bucket name before it is sent to the service.
///
/// `strict` applies the rules for creating buckets: lower case letters, digits, dots and
/// hyphens only.
pub(crate) fn check_bucket_name(bucket: &str, strict: bool) -> Result<(), error::Error> {
    let invalid = |reason: &str| {
        Err(error::invalid_input(format!(
            "invalid bucket name {bucket:?}: {reason}"
        )))
    };

    if bucket.trim().is_empty() {
        return invalid("bucket name cannot be empty");
    }
    if bucket.len() < 3 {
        return invalid("bucket name cannot be less than 3 characters");
    }
    if bucket.len() > 63 {
        return invalid("bucket name cannot be greater than 63 characters");
    }
    if bucket.parse::<Ipv4Addr>().is_ok() {
        return invalid("bucket name cannot be an IP address");
    }

    let regex = if strict {
        &STRICT_BUCKET_NAME
    } else {
        &BUCKET_NAME
    };
    if !regex.is_match(bucket) {
        return invalid("bucket name does not follow S3 standards");
    }
    if bucket.contains("..") || bucket.contains(".-") || bucket.contains("-.") {
        return invalid("bucket name contains invalid successive characters");
    }
    Ok(())
}

/// Check that an argument such as an object name is not empty or blank.
pub(crate) fn check_non_empty(name: &str, value: &str) -> Result<(), error::Error> {
    if value.trim().is_empty() {
        return Err(error::invalid_input(format!("{name} must not be empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_bucket_names() {
        for name in ["abc", "my-bucket", "my.bucket.01", "data_lake", "a:b-c"] {
            assert!(check_bucket_name(name, false).is_ok(), "{name}");
        }
        assert!(check_bucket_name("My-Bucket", false).is_ok());
        assert!(check_bucket_name("my-bucket.01", true).is_ok());
    }

    #[test]
    fn test_invalid_bucket_names() {
        for name in [
            "",
            "  ",
            "ab",
            "192.168.1.1",
            "-bucket",
            "bucket-",
            "my..bucket",
            "my.-bucket",
            "my-.bucket",
            "bucket name",
        ] {
            assert!(check_bucket_name(name, false).is_err(), "{name:?}");
        }
        assert!(check_bucket_name(&"a".repeat(64), false).is_err());
        assert!(check_bucket_name("My-Bucket", true).is_err());
        assert!(check_bucket_name("data_lake", true).is_err());
    }

    #[test]
    fn test_non_empty() {
        assert!(check_non_empty("object name", "key").is_ok());
        assert!(check_non_empty("object name", "").is_err());
        assert!(check_non_empty("object name", " \t").is_err());
    }
}
