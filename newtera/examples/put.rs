/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */
use std::error::Error;
use std::path::PathBuf;
use std::time;

use aws_sdk_s3::error::DisplayErrorContext;
use clap::Parser;
use newtera::config::loader::ConfigLoader;
use newtera::io::InputStream;
use newtera::types::{ConcurrencySetting, PartSize};

type BoxError = Box<dyn Error + Send + Sync>;

const ONE_MEBIBYTE: u64 = 1024 * 1024;

#[derive(Debug, Clone, clap::Parser)]
#[command(name = "put")]
#[command(about = "Uploads a local file or standard input to a Newtera bucket.")]
pub struct Args {
    /// Server to upload to as host[:port]
    #[arg(long, default_value = "localhost:9000")]
    endpoint: String,

    /// Connect using TLS
    #[arg(long, default_value_t = false, action = clap::ArgAction::SetTrue)]
    secure: bool,

    /// Access key
    #[arg(long, env = "NEWTERA_ACCESS_KEY")]
    access_key: Option<String>,

    /// Secret key
    #[arg(long, env = "NEWTERA_SECRET_KEY")]
    secret_key: Option<String>,

    /// Bucket to upload to
    #[arg(required = true)]
    bucket: String,

    /// Object name
    #[arg(required = true)]
    key: String,

    /// File to upload. Standard input is read when omitted.
    #[arg(long)]
    file: Option<PathBuf>,

    /// Part size in bytes. Required for standard input.
    #[arg(long)]
    part_size: Option<u64>,

    /// Number of parts uploaded in parallel
    #[arg(long, default_value_t = 3)]
    parallelism: usize,

    /// Content type of the object
    #[arg(long)]
    content_type: Option<String>,
}

async fn do_upload(args: Args) -> Result<(), BoxError> {
    let mut loader = ConfigLoader::default()
        .endpoint(&args.endpoint)
        .secure(args.secure)
        .concurrency(ConcurrencySetting::Explicit(args.parallelism));
    if let (Some(access_key), Some(secret_key)) = (&args.access_key, &args.secret_key) {
        loader = loader.credentials(access_key, secret_key);
    }
    if let Some(part_size) = args.part_size {
        loader = loader.part_size(PartSize::Target(part_size));
    }
    let tm = newtera::Client::new(loader.load().await?);

    let body = match &args.file {
        Some(path) => InputStream::from_path(path)?,
        None => InputStream::from_reader(tokio::io::stdin(), None),
    };

    let mut request = tm.put_object().bucket(&args.bucket).key(&args.key).body(body);
    if let Some(content_type) = &args.content_type {
        request = request.content_type(content_type);
    }

    let start = time::Instant::now();
    let result = request.send().await?;
    let elapsed = start.elapsed();

    match result.upload_id() {
        Some(upload_id) => tracing::info!("completed multipart upload {upload_id}"),
        None => tracing::info!("completed single request upload"),
    }
    println!(
        "uploaded {}/{} (etag {}) in {elapsed:?}",
        result.bucket(),
        result.key(),
        result.e_tag().unwrap_or("-"),
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_thread_ids(true)
        .init();

    let args = Args::parse();
    if args.file.is_none() && args.part_size.is_none() {
        eprintln!(
            "reading from standard input requires --part-size (at least {} bytes)",
            5 * ONE_MEBIBYTE
        );
        std::process::exit(2);
    }

    if let Err(err) = do_upload(args).await {
        eprintln!("upload failed: {}", DisplayErrorContext(err.as_ref()));
        std::process::exit(1);
    }
    Ok(())
}
