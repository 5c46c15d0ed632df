//! Command-line surface: flag parsing and the async entrypoint shared by `main`
//! and the integration tests.

use crate::config::SyncConfig;
use crate::contract::{BucketInspector, SyncInvoker};
use crate::gsutil::GsutilSync;
use crate::inspect::StorageClient;
use crate::load_config::load_config;
use crate::synchronise::synchronise;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

/// Verify two Cloud Storage buckets, mirror source into target with `gsutil rsync`,
/// then verify the target again.
#[derive(Parser, Debug)]
#[clap(
    name = "gcs-bucket-sync",
    version,
    about = "Mirror one Cloud Storage bucket into another with gsutil rsync, checking both buckets first"
)]
pub struct Cli {
    /// The target project id to sync assets
    #[clap(long)]
    pub target_project: Option<String>,

    /// The target bucket to sync assets
    #[clap(long)]
    pub target_bucket: Option<String>,

    /// The source project id to sync assets from
    #[clap(long)]
    pub source_project: Option<String>,

    /// The source bucket to sync assets from
    #[clap(long)]
    pub source_bucket: Option<String>,

    /// Delete objects in the target bucket that are not contained in the source bucket.
    /// `--delete=false` turns off a `delete: true` from the config file
    #[clap(
        long,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_name = "BOOL"
    )]
    pub delete: Option<bool>,

    /// Optional YAML file providing any of the settings above; flags take precedence
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Base URL of the storage JSON API
    #[clap(long)]
    pub storage_endpoint: Option<String>,

    /// Program used to run the sync
    #[clap(long)]
    pub gsutil: Option<String>,

    /// Timeout for each bucket metadata request
    #[clap(long)]
    pub http_timeout_secs: Option<u64>,

    /// Kill the sync tool if it has not finished after this many seconds
    #[clap(long)]
    pub sync_timeout_secs: Option<u64>,
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    let config = load_config(&cli)?;
    let inspector = StorageClient::from_config(&config);
    let invoker = GsutilSync::from_config(&config);

    run_with(&config, &inspector, &invoker).await
}

/// Runs the pipeline with the given collaborators and prints the report.
pub async fn run_with<I, S>(config: &SyncConfig, inspector: &I, invoker: &S) -> Result<()>
where
    I: BucketInspector + ?Sized,
    S: SyncInvoker + ?Sized,
{
    tracing::info!(command = "sync", "Starting synchronisation process");
    let report = synchronise(config, inspector, invoker)
        .await
        .context("Synchronisation failed")?;

    tracing::info!(command = "sync", ?report, "Synchronisation complete");
    println!("Synchronise complete.\nReport:");
    println!("{:#?}", report);
    Ok(())
}
