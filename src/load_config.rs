use crate::cli::Cli;
use crate::config::{BucketRef, SyncConfig, DEFAULT_GSUTIL, DEFAULT_STORAGE_ENDPOINT};
use crate::error::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StaticConfig {
    source: BucketSection,
    target: BucketSection,
    delete: Option<bool>,
    storage_endpoint: Option<String>,
    gsutil: Option<String>,
    http_timeout_secs: Option<u64>,
    sync_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BucketSection {
    project: Option<String>,
    bucket: Option<String>,
}

/// Reads an optional YAML config file (no secrets; credentials stay with gsutil and the environment).
fn read_static_config(path: &Path) -> Result<StaticConfig, ConfigError> {
    info!(config_path = ?path, "Loading configuration from file");

    let content = fs::read_to_string(path).map_err(|source| {
        error!(error = ?source, config_path = ?path, "Failed to read config file");
        ConfigError::Read {
            path: path.to_path_buf(),
            source,
        }
    })?;

    if content.trim().is_empty() {
        return Ok(StaticConfig::default());
    }

    serde_yaml::from_str(&content).map_err(|source| {
        error!(error = ?source, config_path = ?path, "Failed to parse config YAML");
        ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Merges command-line flags over the optional config file and checks that all
/// four bucket identifiers are present. Flags win; empty strings count as missing.
pub fn load_config(cli: &Cli) -> Result<SyncConfig, ConfigError> {
    let file = match &cli.config {
        Some(path) => read_static_config(path)?,
        None => StaticConfig::default(),
    };

    let pick = |flag: &Option<String>, file: Option<String>| -> String {
        flag.clone()
            .filter(|v| !v.is_empty())
            .or(file)
            .unwrap_or_default()
    };

    let target_project = pick(&cli.target_project, file.target.project);
    let target_bucket = pick(&cli.target_bucket, file.target.bucket);
    let source_project = pick(&cli.source_project, file.source.project);
    let source_bucket = pick(&cli.source_bucket, file.source.bucket);

    let missing: Vec<&'static str> = [
        ("target-project", &target_project),
        ("target-bucket", &target_bucket),
        ("source-project", &source_project),
        ("source-bucket", &source_bucket),
    ]
    .into_iter()
    .filter(|(_, value)| value.is_empty())
    .map(|(flag, _)| flag)
    .collect();

    if !missing.is_empty() {
        error!(?missing, "Required bucket identifiers missing");
        return Err(ConfigError::MissingIdentifiers(missing));
    }

    let config = SyncConfig {
        source: BucketRef::new(source_project, source_bucket),
        target: BucketRef::new(target_project, target_bucket),
        delete_extraneous: cli.delete.or(file.delete).unwrap_or(false),
        storage_endpoint: cli
            .storage_endpoint
            .clone()
            .or(file.storage_endpoint)
            .unwrap_or_else(|| DEFAULT_STORAGE_ENDPOINT.to_string()),
        gsutil: cli
            .gsutil
            .clone()
            .or(file.gsutil)
            .unwrap_or_else(|| DEFAULT_GSUTIL.to_string()),
        http_timeout: cli
            .http_timeout_secs
            .or(file.http_timeout_secs)
            .map(Duration::from_secs),
        sync_timeout: cli
            .sync_timeout_secs
            .or(file.sync_timeout_secs)
            .map(Duration::from_secs),
    };

    config.trace_loaded();
    Ok(config)
}
