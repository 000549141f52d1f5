/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use http_1x::Uri;

use crate::config::Builder;
use crate::error;
use crate::types::{ConcurrencySetting, PartSize};
use crate::Config;

const DEFAULT_REGION: &str = "us-east-1";

/// Load a [`Config`] for a Newtera endpoint.
///
/// Settings not given explicitly (credentials, region, endpoint) are taken from the
/// environment the same way `aws-config` resolves them.
///
/// ```no_run
/// # async fn example() -> Result<(), newtera::error::Error> {
/// let config = newtera::config::loader::ConfigLoader::default()
///     .endpoint("localhost:9000")
///     .secure(false)
///     .credentials("access-key", "secret-key")
///     .load()
///     .await?;
/// let client = newtera::Client::new(config);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    builder: Builder,
    endpoint: Option<String>,
    secure: bool,
    credentials: Option<Credentials>,
    region: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self {
            builder: Builder::default(),
            endpoint: None,
            secure: true,
            credentials: None,
            region: None,
        }
    }
}

impl ConfigLoader {
    /// Server to connect to as `host[:port]`, without scheme or path.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Use TLS to connect to the endpoint. Default is `true`.
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Static access key and secret key
    pub fn credentials(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        self.credentials = Some(Credentials::new(
            access_key,
            secret_key,
            None,
            None,
            "newtera-static",
        ));
        self
    }

    /// Region to sign requests for. Default is the region of the environment, or
    /// `us-east-1`.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// The size of each part when an upload is split into parts.
    ///
    /// Default is [PartSize::Auto]
    pub fn part_size(mut self, part_size: PartSize) -> Self {
        self.builder = self.builder.part_size(part_size);
        self
    }

    /// Set the number of parts of a single upload that are uploaded in parallel.
    ///
    /// Default is [ConcurrencySetting::Auto].
    pub fn concurrency(mut self, concurrency: ConcurrencySetting) -> Self {
        self.builder = self.builder.concurrency(concurrency);
        self
    }

    /// Load the configuration
    ///
    /// If fields have been overridden during builder construction, the override values will be
    /// used. Otherwise, the default values for each field will be provided.
    pub async fn load(self) -> Result<Config, error::Error> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(endpoint) = &self.endpoint {
            let url = endpoint_url(endpoint, self.secure)?;
            tracing::debug!("using endpoint {url}");
            loader = loader.endpoint_url(url);
        }
        if let Some(credentials) = self.credentials {
            loader = loader.credentials_provider(credentials);
        }
        loader = match self.region {
            Some(region) => loader.region(Region::new(region)),
            None => loader.region(RegionProviderChain::default_provider().or_else(DEFAULT_REGION)),
        };

        let shared_config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&shared_config)
            .force_path_style(true)
            .build();
        let client = aws_sdk_s3::Client::from_conf(s3_config);
        Ok(self.builder.client(client).build())
    }
}

/// Build the endpoint URL from a `host[:port]` endpoint.
fn endpoint_url(endpoint: &str, secure: bool) -> Result<String, error::Error> {
    let invalid = |reason: &str| {
        Err(error::invalid_input(format!(
            "invalid endpoint {endpoint:?}: {reason}"
        )))
    };

    if endpoint.trim().is_empty() {
        return invalid("endpoint must not be empty");
    }
    if endpoint.contains("://") {
        return invalid("scheme is not allowed; use `secure` to select https");
    }

    let scheme = if secure { "https" } else { "http" };
    let uri: Uri = match format!("{scheme}://{endpoint}").parse() {
        Ok(uri) => uri,
        Err(err) => return invalid(&err.to_string()),
    };
    let authority = match uri.authority() {
        Some(authority) => authority,
        None => return invalid("host is missing"),
    };
    if authority.as_str().contains('@') {
        return invalid("user info is not allowed");
    }
    if !matches!(uri.path(), "" | "/") || endpoint.ends_with('/') {
        return invalid("path is not allowed");
    }
    if uri.query().is_some() {
        return invalid("query is not allowed");
    }
    if authority.host().is_empty() {
        return invalid("host is missing");
    }

    let port = match (authority.port(), authority.port_u16()) {
        (Some(_), None) | (_, Some(0)) => return invalid("port must be between 1 and 65535"),
        (_, port) => port,
    };
    let url = match port {
        Some(443) if secure => format!("{scheme}://{}", authority.host()),
        Some(80) if !secure => format!("{scheme}://{}", authority.host()),
        Some(port) => format!("{scheme}://{}:{port}", authority.host()),
        None => format!("{scheme}://{}", authority.host()),
    };
    Ok(url)
}
