//! # contract: the two collaborators a sync run talks to
//!
//! The orchestrator in [`crate::synchronise`] is generic over these traits so that
//! the real HTTP client and `gsutil` wrapper can be swapped for `mockall` mocks.
//! Mocks (`MockBucketInspector`, `MockSyncInvoker`) are exported under the default
//! `test-export-mocks` feature for integration tests.

use async_trait::async_trait;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::bucket::BucketMetadata;
use crate::config::BucketRef;
use crate::error::{InspectError, SyncError};

/// One invocation of the external sync tool. Output is forwarded, not retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRun {
    pub source_bucket: String,
    pub target_bucket: String,
    /// Delete target objects that are absent from the source.
    pub delete_extraneous: bool,
}

/// Read-only bucket metadata lookup.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait BucketInspector: Send + Sync {
    /// Fetch metadata for `bucket`. Any decodable response body is a success.
    async fn inspect(&self, bucket: &BucketRef) -> Result<BucketMetadata, InspectError>;
}

/// Runs the external mirror tool to completion.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait SyncInvoker: Send + Sync {
    /// Returns once the tool has exited and all of its output has been forwarded.
    async fn sync(&self, run: &SyncRun) -> Result<(), SyncError>;
}
