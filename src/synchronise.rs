//! High-level pipeline: verify source → verify target → sync → verify target again.
//!
//! The orchestrator is generic over [`BucketInspector`] and [`SyncInvoker`] so the
//! CLI can pass the real HTTP client and `gsutil` wrapper while tests pass mocks.
//!
//! # Responsibilities
//! - Fail fast: the first failing step ends the run, later steps never execute
//! - The pre-sync checks stop a transfer against an unreachable or misconfigured bucket
//! - The post-sync check only confirms the target is still describable; it does not
//!   compare contents
//! - No rollback after a partial transfer
//!
//! # Error Handling
//! Inspection failures are tagged with the [`Checkpoint`] they happened at; sync
//! failures are passed through as [`SyncError`](crate::error::SyncError).

use std::fmt;
use std::time::{Duration, Instant};

use tracing::{error, info};

use crate::bucket::BucketMetadata;
use crate::config::{BucketRef, SyncConfig};
use crate::contract::{BucketInspector, SyncInvoker, SyncRun};
use crate::error::SynchroniseError;

/// Where in the sequence a bucket inspection happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    VerifySource,
    VerifyTarget,
    VerifyTargetAgain,
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Checkpoint::VerifySource => "source bucket check",
            Checkpoint::VerifyTarget => "target bucket check",
            Checkpoint::VerifyTargetAgain => "post-sync target bucket check",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct SynchroniseReport {
    pub source: BucketSummary,
    pub target: BucketSummary,
    pub delete_extraneous: bool,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketSummary {
    pub project: String,
    pub bucket: String,
    pub location: String,
    pub storage_class: String,
}

impl BucketSummary {
    fn new(bucket: &BucketRef, metadata: &BucketMetadata) -> Self {
        Self {
            project: bucket.project.clone(),
            bucket: bucket.bucket.clone(),
            location: metadata.location.clone(),
            storage_class: metadata.storage_class.clone(),
        }
    }
}

async fn verify<I>(
    inspector: &I,
    checkpoint: Checkpoint,
    bucket: &BucketRef,
) -> Result<BucketMetadata, SynchroniseError>
where
    I: BucketInspector + ?Sized,
{
    info!(%checkpoint, bucket = %bucket, "[SYNC] Verifying bucket");
    match inspector.inspect(bucket).await {
        Ok(metadata) => {
            info!(%checkpoint, bucket = %bucket, "[SYNC] Bucket verified");
            Ok(metadata)
        }
        Err(e) => {
            error!(%checkpoint, bucket = %bucket, error = ?e, "[SYNC][ERROR] Bucket verification failed");
            Err(SynchroniseError::Inspect {
                checkpoint,
                source: e,
            })
        }
    }
}

/// Runs the whole sequence once. Returns at the first failing step.
pub async fn synchronise<I, S>(
    config: &SyncConfig,
    inspector: &I,
    invoker: &S,
) -> Result<SynchroniseReport, SynchroniseError>
where
    I: BucketInspector + ?Sized,
    S: SyncInvoker + ?Sized,
{
    let started = Instant::now();
    info!(
        source = %config.source,
        target = %config.target,
        delete = config.delete_extraneous,
        "[SYNC] Starting bucket synchronisation"
    );

    let source_meta = verify(inspector, Checkpoint::VerifySource, &config.source).await?;
    verify(inspector, Checkpoint::VerifyTarget, &config.target).await?;

    let run = SyncRun {
        source_bucket: config.source.bucket.clone(),
        target_bucket: config.target.bucket.clone(),
        delete_extraneous: config.delete_extraneous,
    };
    if let Err(e) = invoker.sync(&run).await {
        error!(error = ?e, "[SYNC][ERROR] Sync step failed");
        return Err(e.into());
    }
    info!("[SYNC] Sync step succeeded");

    let target_meta = verify(inspector, Checkpoint::VerifyTargetAgain, &config.target).await?;

    let report = SynchroniseReport {
        source: BucketSummary::new(&config.source, &source_meta),
        target: BucketSummary::new(&config.target, &target_meta),
        delete_extraneous: config.delete_extraneous,
        elapsed: started.elapsed(),
    };
    info!(elapsed = ?report.elapsed, "[SYNC] Bucket synchronisation complete");
    Ok(report)
}
