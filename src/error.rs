//! Error types for each stage of a sync run.

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

use crate::synchronise::Checkpoint;

// Display strings leave the wrapped error out; it is reported through `source()`.

/// Configuration could not be assembled from flags and the optional config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("parameters {} are required", quoted(.0))]
    MissingIdentifiers(Vec<&'static str>),

    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config YAML {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

fn quoted(flags: &[&'static str]) -> String {
    flags
        .iter()
        .map(|flag| format!("'{flag}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// A bucket metadata lookup failed.
#[derive(Debug, Error)]
pub enum InspectError {
    #[error("storage endpoint '{endpoint}' cannot be used as a base URL")]
    Endpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build metadata request for bucket '{bucket}'")]
    Request {
        bucket: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("metadata request for bucket '{bucket}' failed")]
    Transport {
        bucket: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("metadata for bucket '{bucket}' is not valid JSON")]
    Decode {
        bucket: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("metadata request for bucket '{bucket}' timed out after {after:?}")]
    TimedOut { bucket: String, after: Duration },
}

/// The external sync tool could not be run to a successful exit.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to launch {program}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to wait for {program}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited unsuccessfully ({status})")]
    Exited { program: String, status: ExitStatus },

    #[error("failed to forward {stream} of {program}")]
    Forward {
        program: String,
        stream: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} did not finish within {after:?} and was killed")]
    TimedOut { program: String, after: Duration },
}

/// A sync run stopped at one of its steps.
#[derive(Debug, Error)]
pub enum SynchroniseError {
    #[error("{checkpoint} failed")]
    Inspect {
        checkpoint: Checkpoint,
        #[source]
        source: InspectError,
    },

    #[error("sync failed")]
    Sync(#[from] SyncError),
}
