/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::Instrument;

use crate::backend::{ListObjectsPage, ListObjectsRequest};
use crate::error::{self, Error};
use crate::types::ObjectInfo;
use crate::validate;

const DEFAULT_MAX_KEYS: i32 = 1000;

/// Fluent builder for listing the objects of a bucket
#[derive(Debug)]
pub struct ListObjectsFluentBuilder {
    handle: Arc<crate::client::Handle>,
    bucket: Option<String>,
    prefix: Option<String>,
    start_after: Option<String>,
    recursive: bool,
    max_keys: i32,
}

impl ListObjectsFluentBuilder {
    pub(crate) fn new(handle: Arc<crate::client::Handle>) -> Self {
        Self {
            handle,
            bucket: None,
            prefix: None,
            start_after: None,
            recursive: false,
            max_keys: DEFAULT_MAX_KEYS,
        }
    }

    /// The bucket name. This field is required.
    pub fn bucket(mut self, input: impl Into<String>) -> Self {
        self.bucket = Some(input.into());
        self
    }

    /// Only list objects whose names start with this prefix.
    pub fn prefix(mut self, input: impl Into<String>) -> Self {
        self.prefix = Some(input.into());
        self
    }

    /// Start listing after this object name.
    pub fn start_after(mut self, input: impl Into<String>) -> Self {
        self.start_after = Some(input.into());
        self
    }

    /// List all objects below the prefix instead of grouping names at `/` into
    /// directory entries. Default is `false`.
    pub fn recursive(mut self, input: bool) -> Self {
        self.recursive = input;
        self
    }

    /// Maximum number of entries requested per page, between 1 and 1000.
    pub fn max_keys(mut self, input: i32) -> Self {
        self.max_keys = input;
        self
    }

    /// Start the listing. Pages are requested as the returned stream is consumed.
    pub fn send(self) -> Result<ListObjectsStream, Error> {
        let bucket = self.bucket.unwrap_or_default();
        validate::check_bucket_name(&bucket, false)?;
        if !(1..=DEFAULT_MAX_KEYS).contains(&self.max_keys) {
            return Err(error::invalid_input(format!(
                "max keys must be between 1 and {DEFAULT_MAX_KEYS}, got {}",
                self.max_keys
            )));
        }

        let request = ListObjectsRequest {
            bucket,
            prefix: self.prefix,
            delimiter: (!self.recursive).then(|| "/".to_owned()),
            start_after: self.start_after,
            continuation_token: None,
            max_keys: self.max_keys,
        };
        Ok(ListObjectsStream {
            paginator: ListObjectsPaginator::new(self.handle, request),
            buffer: VecDeque::new(),
        })
    }
}

/// Objects of a listing, fetched a page at a time.
///
/// Common prefixes of a non-recursive listing are returned as entries with
/// [`is_dir`](ObjectInfo::is_dir) set.
#[derive(Debug)]
pub struct ListObjectsStream {
    paginator: ListObjectsPaginator,
    buffer: VecDeque<ObjectInfo>,
}

impl ListObjectsStream {
    /// The next object, `None` once the listing is exhausted.
    pub async fn next(&mut self) -> Option<Result<ObjectInfo, Error>> {
        while self.buffer.is_empty() {
            match self.paginator.next_page().await? {
                Ok(page) => self.buffer.extend(page),
                Err(err) => return Some(Err(err)),
            }
        }
        self.buffer.pop_front().map(Ok)
    }

    /// Read the rest of the listing into memory.
    pub async fn collect(mut self) -> Result<Vec<ObjectInfo>, Error> {
        let mut objects = Vec::new();
        while let Some(object) = self.next().await {
            objects.push(object?);
        }
        Ok(objects)
    }
}

/// Paginator over `ListObjectsV2` following continuation tokens.
#[derive(Debug)]
struct ListObjectsPaginator {
    handle: Arc<crate::client::Handle>,
    request: ListObjectsRequest,
    state: State,
}

#[derive(Debug, PartialEq)]
enum State {
    Paginating { next_token: Option<String> },
    Done,
}

impl State {
    fn next_state(self, page: &ListObjectsPage) -> State {
        match (self, &page.next_continuation_token) {
            (State::Paginating { .. }, Some(token)) => State::Paginating {
                next_token: Some(token.clone()),
            },
            _ => State::Done,
        }
    }
}

impl ListObjectsPaginator {
    fn new(handle: Arc<crate::client::Handle>, request: ListObjectsRequest) -> Self {
        Self {
            handle,
            request,
            state: State::Paginating { next_token: None },
        }
    }

    async fn next_page(&mut self) -> Option<Result<Vec<ObjectInfo>, Error>> {
        let continuation_token = match &self.state {
            State::Done => return None,
            State::Paginating { next_token } => next_token.clone(),
        };
        let request = ListObjectsRequest {
            continuation_token,
            ..self.request.clone()
        };

        let result = self
            .handle
            .config
            .backend()
            .list_objects(request)
            .instrument(tracing::debug_span!("send-list-objects"))
            .await;
        match result {
            Ok(page) => {
                let prev_state = std::mem::replace(&mut self.state, State::Done);
                self.state = prev_state.next_state(&page);
                Some(Ok(page_entries(&self.request.bucket, page)))
            }
            Err(err) => {
                self.state = State::Done;
                Some(Err(err))
            }
        }
    }
}

fn page_entries(bucket: &str, page: ListObjectsPage) -> Vec<ObjectInfo> {
    let ListObjectsPage {
        mut objects,
        common_prefixes,
        ..
    } = page;
    objects.extend(
        common_prefixes
            .into_iter()
            .map(|prefix| ObjectInfo::prefix(bucket, prefix)),
    );
    objects
}

#[cfg(test)]
mod tests {
    use super::{page_entries, State};
    use crate::backend::ListObjectsPage;
    use crate::types::ObjectInfo;

    fn page(next_token: Option<&str>, keys: &[&str], prefixes: &[&str]) -> ListObjectsPage {
        ListObjectsPage {
            objects: keys
                .iter()
                .map(|key| ObjectInfo {
                    bucket: "test-bucket".to_owned(),
                    key: key.to_string(),
                    ..Default::default()
                })
                .collect(),
            common_prefixes: prefixes.iter().map(|p| p.to_string()).collect(),
            next_continuation_token: next_token.map(str::to_owned),
        }
    }

    #[test]
    fn test_next_state() {
        let start = State::Paginating { next_token: None };

        let state2 = start.next_state(&page(Some("token1"), &["k1", "k2"], &[]));
        assert_eq!(
            state2,
            State::Paginating {
                next_token: Some("token1".to_owned())
            }
        );

        let state3 = state2.next_state(&page(None, &["k3"], &[]));
        assert_eq!(state3, State::Done);

        let state4 = state3.next_state(&page(Some("token2"), &[], &[]));
        assert_eq!(state4, State::Done);
    }

    #[test]
    fn test_prefixes_become_dir_entries() {
        let entries = page_entries("test-bucket", page(None, &["a.txt"], &["photos/"]));
        assert_eq!(2, entries.len());
        assert_eq!("a.txt", entries[0].key);
        assert!(!entries[0].is_dir);
        assert_eq!("photos/", entries[1].key);
        assert!(entries[1].is_dir);
        assert_eq!("test-bucket", entries[1].bucket);
    }
}
