use clap::Parser;
use gcs_bucket_sync::cli::Cli;
use gcs_bucket_sync::config::BucketRef;
use gcs_bucket_sync::error::ConfigError;
use gcs_bucket_sync::load_config::load_config;
use std::fs::write;
use std::time::Duration;
use tempfile::NamedTempFile;

fn cli_with_config(config: &NamedTempFile, extra: &[&str]) -> Cli {
    let mut args = vec![
        "gcs-bucket-sync".to_string(),
        "--config".to_string(),
        config.path().display().to_string(),
    ];
    args.extend(extra.iter().map(|a| a.to_string()));
    Cli::parse_from(args)
}

/// A complete config file yields a complete SyncConfig without any flags.
#[test]
fn test_load_config_from_file_only() {
    let config_yaml = r#"
source:
  project: acme-prod
  bucket: assets-prod
target:
  project: acme-dr
  bucket: assets-dr
delete: true
storage_endpoint: http://localhost:4443
gsutil: /opt/google-cloud-sdk/bin/gsutil
http_timeout_secs: 15
sync_timeout_secs: 7200
"#;
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), config_yaml).unwrap();

    let config = load_config(&cli_with_config(&config_file, &[])).expect("Config should load");

    assert_eq!(config.source, BucketRef::new("acme-prod", "assets-prod"));
    assert_eq!(config.target, BucketRef::new("acme-dr", "assets-dr"));
    assert!(config.delete_extraneous);
    assert_eq!(config.storage_endpoint, "http://localhost:4443");
    assert_eq!(config.gsutil, "/opt/google-cloud-sdk/bin/gsutil");
    assert_eq!(config.http_timeout, Some(Duration::from_secs(15)));
    assert_eq!(config.sync_timeout, Some(Duration::from_secs(7200)));
}

/// Flags take precedence over file values.
#[test]
fn test_load_config_flags_override_file() {
    let config_yaml = r#"
source: { project: p1, bucket: b1 }
target: { project: p2, bucket: b2 }
http_timeout_secs: 15
"#;
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), config_yaml).unwrap();

    let config = load_config(&cli_with_config(
        &config_file,
        &["--source-bucket=other", "--http-timeout-secs=3", "--delete"],
    ))
    .expect("Config should load");

    assert_eq!(config.source, BucketRef::new("p1", "other"));
    assert_eq!(config.target, BucketRef::new("p2", "b2"));
    assert!(config.delete_extraneous);
    assert_eq!(config.http_timeout, Some(Duration::from_secs(3)));
}

/// A partial file plus no flags names every identifier that is still missing.
#[test]
fn test_load_config_errors_on_missing_identifiers() {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), "source:\n  project: p1\n").unwrap();

    let err = load_config(&cli_with_config(&config_file, &[])).unwrap_err();
    let msg = err.to_string();

    assert!(matches!(err, ConfigError::MissingIdentifiers(_)));
    assert!(
        msg.contains("'target-project'")
            && msg.contains("'target-bucket'")
            && msg.contains("'source-bucket'")
            && !msg.contains("'source-project'"),
        "unexpected message: {msg}"
    );
}

/// An empty file is the same as no file.
#[test]
fn test_load_config_accepts_empty_file() {
    let config_file = NamedTempFile::new().expect("temp file");

    let config = load_config(&cli_with_config(
        &config_file,
        &[
            "--source-project=p1",
            "--source-bucket=b1",
            "--target-project=p2",
            "--target-bucket=b2",
        ],
    ))
    .expect("Config should load");

    assert!(!config.delete_extraneous);
}

#[test]
fn test_load_config_errors_for_invalid_file() {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), b"source: [:::").unwrap();

    let err = load_config(&cli_with_config(&config_file, &[])).unwrap_err();
    let msg = err.to_string();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(msg.contains("parse") || msg.contains("YAML"), "Parse error expected, got: {msg}");
}

#[test]
fn test_load_config_errors_for_missing_file() {
    let cli = Cli::parse_from([
        "gcs-bucket-sync",
        "--config",
        "/definitely/not/here/bucket-sync.yaml",
    ]);

    let err = load_config(&cli).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }), "got {err:?}");
}

/// `--delete=false` switches off mirroring that the file turned on.
#[test]
fn test_load_config_delete_flag_can_disable_file_setting() {
    let config_yaml = r#"
source: { project: p1, bucket: b1 }
target: { project: p2, bucket: b2 }
delete: true
"#;
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), config_yaml).unwrap();

    let disabled = load_config(&cli_with_config(&config_file, &["--delete=false"]))
        .expect("Config should load");
    assert!(!disabled.delete_extraneous);

    let from_file = load_config(&cli_with_config(&config_file, &[])).expect("Config should load");
    assert!(from_file.delete_extraneous);
}
