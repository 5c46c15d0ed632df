// gcs-bucket-sync/src/config.rs

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const DEFAULT_STORAGE_ENDPOINT: &str = "https://storage.googleapis.com";
pub const DEFAULT_GSUTIL: &str = "gsutil";

/// Immutable settings for one sync run, built once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    pub source: BucketRef,
    pub target: BucketRef,
    pub delete_extraneous: bool,
    pub storage_endpoint: String,
    pub gsutil: String,
    pub http_timeout: Option<Duration>,
    pub sync_timeout: Option<Duration>,
}

impl SyncConfig {
    pub fn trace_loaded(&self) {
        info!(
            source = %self.source,
            target = %self.target,
            delete = self.delete_extraneous,
            "Loaded SyncConfig"
        );
        debug!(?self, "SyncConfig loaded (full debug)");
    }
}

/// A bucket name and the project that owns it. Neither is validated locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketRef {
    pub project: String,
    pub bucket: String,
}

impl BucketRef {
    pub fn new(project: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            bucket: bucket.into(),
        }
    }
}

impl fmt::Display for BucketRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.project, self.bucket)
    }
}
