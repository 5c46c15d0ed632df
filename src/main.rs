use anyhow::Result;
use clap::Parser;
use gcs_bucket_sync::cli::{run, Cli};
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` (also read from `.env`) wins; otherwise log at info.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment before the filter reads RUST_LOG
    dotenvy::dotenv().ok();

    // Logs go to stderr; stdout carries gsutil output and the report.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
    tracing::info!("CLI application startup: tracing initialised, environment loaded");

    let cli = Cli::parse();
    tracing::info!("CLI arguments parsed, invoking run");
    let result = run(cli).await;
    match &result {
        Ok(_) => tracing::info!("CLI completed successfully"),
        Err(e) => tracing::error!(error = ?e, "CLI exited with error"),
    }
    result
}
