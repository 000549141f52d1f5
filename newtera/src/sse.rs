/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::BTreeMap;
use std::fmt;

use aws_smithy_types::base64;
use md5::{Digest, Md5};

use crate::error;

const AES256: &str = "AES256";
const CUSTOMER_KEY_LEN: usize = 32;

pub(crate) const SSE_C_ALGORITHM: &str = "x-amz-server-side-encryption-customer-algorithm";
pub(crate) const SSE_C_KEY: &str = "x-amz-server-side-encryption-customer-key";
pub(crate) const SSE_C_KEY_MD5: &str = "x-amz-server-side-encryption-customer-key-md5";

/// Server-side encryption of an uploaded object
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ServerSideEncryption {
    /// Encrypt with a key managed by the server (`AES256`)
    S3,

    /// Encrypt with a key held by the key management service
    Kms {
        /// ID of the key
        key_id: String,
        /// Encryption context as a JSON object
        context: Option<String>,
    },

    /// Encrypt with a key provided by the client.
    ///
    /// The same key has to be given to read the object back.
    Customer(SseCustomerKey),
}

impl ServerSideEncryption {
    /// The customer-provided key, for [`Customer`](ServerSideEncryption::Customer) encryption
    pub fn customer_key(&self) -> Option<&SseCustomerKey> {
        match self {
            ServerSideEncryption::Customer(key) => Some(key),
            _ => None,
        }
    }
}

/// A 256-bit key for server-side encryption with a customer-provided key (SSE-C).
#[derive(Clone, PartialEq, Eq)]
pub struct SseCustomerKey {
    key: String,
    key_md5: String,
}

impl SseCustomerKey {
    /// Create a key from its 32 raw bytes.
    pub fn new(key: impl AsRef<[u8]>) -> Result<Self, error::Error> {
        let key = key.as_ref();
        if key.len() != CUSTOMER_KEY_LEN {
            return Err(error::invalid_input(format!(
                "SSE-C keys need to be {CUSTOMER_KEY_LEN} bytes long, got {} bytes",
                key.len()
            )));
        }
        Ok(Self {
            key: base64::encode(key),
            key_md5: base64::encode(Md5::digest(key).as_slice()),
        })
    }

    /// Encryption algorithm, always `AES256`
    pub fn algorithm(&self) -> &str {
        AES256
    }

    /// The base64-encoded key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The base64-encoded MD5 digest of the key
    pub fn key_md5(&self) -> &str {
        &self.key_md5
    }

    /// Request headers carrying this key, keyed in lower case.
    pub fn headers(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (SSE_C_ALGORITHM.to_owned(), AES256.to_owned()),
            (SSE_C_KEY.to_owned(), self.key.clone()),
            (SSE_C_KEY_MD5.to_owned(), self.key_md5.clone()),
        ])
    }
}

impl fmt::Debug for SseCustomerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SseCustomerKey")
            .field("key", &"** redacted **")
            .field("key_md5", &self.key_md5)
            .finish()
    }
}
