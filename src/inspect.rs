//! Bucket metadata lookups against the Cloud Storage JSON API.
//!
//! One `GET {endpoint}/storage/v1/b/{bucket}?project={project}` per call, no retries.
//! The HTTP status is not used to decide success: whatever body comes back is
//! decoded, and only request, transport or decode failures are errors. Callers
//! use the lookup as a reachability check.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::bucket::{decode_metadata, BucketMetadata};
use crate::config::{BucketRef, SyncConfig};
use crate::contract::BucketInspector;
use crate::error::InspectError;

pub struct StorageClient {
    http: Client,
    endpoint: String,
    timeout: Option<Duration>,
}

impl StorageClient {
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            http: Client::new(),
            endpoint: endpoint.into(),
            timeout,
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(config.storage_endpoint.clone(), config.http_timeout)
    }

    /// The bucket name is appended as a single path segment, never normalised.
    fn metadata_url(&self, bucket: &str) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&self.endpoint)?;
        url.path_segments_mut()
            .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(["storage", "v1", "b", bucket]);
        Ok(url)
    }

    fn transport_error(&self, bucket: &str, source: reqwest::Error) -> InspectError {
        match self.timeout {
            Some(after) if source.is_timeout() => InspectError::TimedOut {
                bucket: bucket.to_string(),
                after,
            },
            _ => InspectError::Transport {
                bucket: bucket.to_string(),
                source,
            },
        }
    }
}

#[async_trait]
impl BucketInspector for StorageClient {
    async fn inspect(&self, target: &BucketRef) -> Result<BucketMetadata, InspectError> {
        let url = self.metadata_url(&target.bucket).map_err(|source| {
            error!(error = ?source, endpoint = %self.endpoint, "[INSPECT][ERROR] Storage endpoint is not a usable base URL");
            InspectError::Endpoint {
                endpoint: self.endpoint.clone(),
                source,
            }
        })?;

        let mut builder = self
            .http
            .get(url.clone())
            .query(&[("project", target.project.as_str())]);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let request = builder.build().map_err(|source| {
            error!(error = ?source, url = %url, "[INSPECT][ERROR] Failed to build metadata request");
            InspectError::Request {
                bucket: target.bucket.clone(),
                source,
            }
        })?;

        debug!(url = %request.url(), "[INSPECT] Requesting bucket metadata");

        let response = self.http.execute(request).await.map_err(|e| {
            error!(error = ?e, bucket = %target.bucket, project = %target.project, "[INSPECT][ERROR] Metadata request failed");
            self.transport_error(&target.bucket, e)
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                status = %status,
                bucket = %target.bucket,
                project = %target.project,
                "[INSPECT] Storage API returned a non-success status; decoding body anyway"
            );
        }

        let body = response.bytes().await.map_err(|e| {
            error!(error = ?e, bucket = %target.bucket, "[INSPECT][ERROR] Failed to read metadata response body");
            self.transport_error(&target.bucket, e)
        })?;

        let metadata = decode_metadata(&body).map_err(|source| {
            error!(error = ?source, bucket = %target.bucket, "[INSPECT][ERROR] Failed to decode bucket metadata");
            InspectError::Decode {
                bucket: target.bucket.clone(),
                source,
            }
        })?;

        info!(
            bucket = %target.bucket,
            project = %target.project,
            status = status.as_u16(),
            location = %metadata.location,
            storage_class = %metadata.storage_class,
            "[INSPECT] Bucket metadata retrieved"
        );
        debug!(?metadata, "[INSPECT] Bucket metadata (full debug)");

        Ok(metadata)
    }
}
