/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use aws_sdk_s3::error::DisplayErrorContext;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tower::{service_fn, Service, ServiceExt};
use tracing::Instrument;

use crate::backend;
use crate::error::{self, Error, ErrorKind};
use crate::io::part_reader::PartData;
use crate::operation::put_object::context::UploadContext;
use crate::types::CompletedPart;

/// Request/input type for our "upload_part" service.
#[derive(Debug, Clone)]
pub(super) struct UploadPartRequest {
    pub(super) ctx: UploadContext,
    pub(super) upload_id: String,
    pub(super) part_data: PartData,
}

/// handler (service fn) for a single part
async fn upload_part_handler(request: UploadPartRequest) -> Result<CompletedPart, Error> {
    let UploadPartRequest {
        ctx,
        upload_id,
        part_data,
    } = request;
    let part_number = part_data.part_number;

    let e_tag = ctx
        .backend()
        .upload_part(backend::UploadPartRequest {
            bucket: ctx.bucket().to_owned(),
            key: ctx.key().to_owned(),
            upload_id,
            part_number,
            extra_headers: ctx.request.part_headers.clone(),
            body: part_data.data,
        })
        .await
        .map_err(|err| error::part_upload_failed(part_number, err))?;

    tracing::trace!("completed upload of part number {}", part_number);
    Ok(CompletedPart {
        part_number,
        e_tag,
    })
}

/// Create a new tower::Service for uploading individual parts of an object
pub(super) fn upload_part_service() -> impl Service<
    UploadPartRequest,
    Response = CompletedPart,
    Error = error::Error,
    Future: Send,
> + Clone
       + Send
       + 'static {
    service_fn(upload_part_handler)
}

type PartResult = Result<CompletedPart, Error>;

/// Uploads parts as they are read, either inline or on a fixed pool of worker tasks.
///
/// Completed parts are collected by the dispatcher itself (workers report through a
/// channel) and returned ordered by part number from [`finish`](Self::finish).
#[derive(Debug)]
pub(super) struct PartDispatcher {
    ctx: UploadContext,
    upload_id: String,
    mode: Mode,
    completed: Vec<CompletedPart>,
    first_error: Option<Error>,
    dispatched: usize,
}

#[derive(Debug)]
enum Mode {
    Inline,
    Pool(WorkerPool),
}

#[derive(Debug)]
struct WorkerPool {
    work_tx: async_channel::Sender<UploadPartRequest>,
    results_rx: mpsc::UnboundedReceiver<PartResult>,
    workers: JoinSet<()>,
    failed_tx: Arc<watch::Sender<bool>>,
}

impl PartDispatcher {
    /// Create a dispatcher for the upload `upload_id`.
    ///
    /// With a `parallelism` of 1 or less parts are uploaded inline by
    /// [`dispatch`](Self::dispatch); otherwise `parallelism` workers are spawned.
    pub(super) fn new(ctx: UploadContext, upload_id: String, parallelism: usize) -> Self {
        let mode = if parallelism <= 1 {
            Mode::Inline
        } else {
            Mode::Pool(WorkerPool::spawn(parallelism))
        };
        tracing::trace!("dispatching part uploads with parallelism {parallelism}");

        Self {
            ctx,
            upload_id,
            mode,
            completed: Vec::new(),
            first_error: None,
            dispatched: 0,
        }
    }

    /// Whether an upload has failed. No further parts should be dispatched once it has.
    pub(super) fn has_failed(&self) -> bool {
        self.first_error.is_some()
    }

    /// Upload a part, or queue it for upload by the worker pool.
    ///
    /// Waits for room in the queue when all workers are busy. Failures of the upload
    /// itself are reported by [`has_failed`](Self::has_failed) and [`finish`](Self::finish).
    pub(super) async fn dispatch(&mut self, part_data: PartData) -> Result<(), Error> {
        let request = UploadPartRequest {
            ctx: self.ctx.clone(),
            upload_id: self.upload_id.clone(),
            part_data,
        };
        self.dispatched += 1;

        let results = match &mut self.mode {
            Mode::Inline => vec![upload_part_service().oneshot(request).await],
            Mode::Pool(pool) => {
                pool.work_tx.send(request).await.map_err(|_| {
                    Error::new(
                        ErrorKind::RuntimeError,
                        "part upload workers exited unexpectedly",
                    )
                })?;
                pool.ready_results()
            }
        };
        for result in results {
            self.record(result);
        }
        Ok(())
    }

    fn record(&mut self, result: PartResult) {
        match result {
            Ok(part) => self.completed.push(part),
            Err(err) if self.first_error.is_none() => {
                tracing::debug!("part upload failed: {}", DisplayErrorContext(&err));
                if let Mode::Pool(pool) = &self.mode {
                    pool.failed_tx.send_replace(true);
                }
                self.first_error = Some(err);
            }
            Err(err) => {
                tracing::trace!("ignoring subsequent failure: {}", DisplayErrorContext(&err));
            }
        }
    }

    /// Wait for all dispatched uploads and return the completed parts ordered by part
    /// number, or the first failure.
    #[tracing::instrument(skip_all, level = "debug", name = "join-part-uploads")]
    pub(super) async fn finish(mut self) -> Result<Vec<CompletedPart>, Error> {
        if let Mode::Pool(pool) = std::mem::replace(&mut self.mode, Mode::Inline) {
            let WorkerPool {
                work_tx,
                mut results_rx,
                mut workers,
                failed_tx,
            } = pool;
            // workers exit once the queue is closed and drained
            drop(work_tx);
            while let Some(joined) = workers.join_next().await {
                if let Err(err) = joined {
                    self.record(Err(err.into()));
                }
            }
            while let Some(result) = results_rx.recv().await {
                self.record(result);
            }
            drop(failed_tx);
        }

        match self.first_error.take() {
            Some(err) => Err(err),
            None => ordered_parts(self.completed, self.dispatched),
        }
    }
}

impl WorkerPool {
    fn spawn(workers: usize) -> Self {
        let (work_tx, work_rx) = async_channel::bounded(workers);
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        let (failed_tx, _) = watch::channel(false);
        let failed_tx = Arc::new(failed_tx);

        let svc = upload_part_service();
        let mut tasks = JoinSet::new();
        for i in 0..workers {
            let worker = upload_parts(
                svc.clone(),
                work_rx.clone(),
                results_tx.clone(),
                failed_tx.clone(),
            );
            tasks.spawn(worker.instrument(tracing::debug_span!("part-uploader", worker = i)));
        }

        Self {
            work_tx,
            results_rx,
            workers: tasks,
            failed_tx,
        }
    }

    /// Results reported so far, without waiting.
    fn ready_results(&mut self) -> Vec<PartResult> {
        let mut results = Vec::new();
        while let Ok(result) = self.results_rx.try_recv() {
            results.push(result);
        }
        results
    }
}

/// Worker loop: upload queued parts until the queue is closed.
///
/// A worker whose upload fails raises the shared failure flag. Parts still queued are
/// skipped by every worker once it is set.
async fn upload_parts<S>(
    svc: S,
    work_rx: async_channel::Receiver<UploadPartRequest>,
    results_tx: mpsc::UnboundedSender<PartResult>,
    failed_tx: Arc<watch::Sender<bool>>,
) where
    S: Service<UploadPartRequest, Response = CompletedPart, Error = Error> + Clone + Send,
    S::Future: Send,
{
    while let Ok(request) = work_rx.recv().await {
        let part_number = request.part_data.part_number;
        if *failed_tx.borrow() {
            tracing::trace!("skipping upload of part {part_number} after an earlier failure");
            continue;
        }
        let result = svc.clone().oneshot(request).await;
        if result.is_err() {
            failed_tx.send_replace(true);
        }
        if results_tx.send(result).is_err() {
            break;
        }
    }
}

/// Sort completed parts by part number and check that they are contiguous from 1.
fn ordered_parts(
    mut parts: Vec<CompletedPart>,
    expected: usize,
) -> Result<Vec<CompletedPart>, Error> {
    parts.sort_by_key(|p| p.part_number);

    if parts.len() != expected {
        return Err(Error::new(
            ErrorKind::ValidationFailed,
            format!(
                "expected {expected} completed parts but {} parts were uploaded",
                parts.len()
            ),
        ));
    }
    for (i, part) in parts.iter().enumerate() {
        let expected_number = i as i32 + 1;
        if part.part_number != expected_number {
            return Err(Error::new(
                ErrorKind::ValidationFailed,
                format!(
                    "completed parts are not contiguous: expected part {expected_number}, found part {}",
                    part.part_number
                ),
            ));
        }
    }
    Ok(parts)
}
