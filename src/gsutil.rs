//! Runs `gsutil rsync` between two buckets and streams its output live.
//!
//! stdout and stderr of the child are copied to our own stdout and stderr by two
//! spawned tasks as bytes arrive. Both tasks are joined before [`GsutilSync::sync`]
//! returns, so everything the tool printed has been forwarded by then. An
//! optional timeout, counted from spawn, bounds the wait and both joins together.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::SyncConfig;
use crate::contract::{SyncInvoker, SyncRun};
use crate::error::SyncError;

pub const BUCKET_SCHEME: &str = "gs";

/// Boto options passed with `-o`, fixed for every run.
const TUNING_OPTIONS: [&str; 4] = [
    "GSUtil:use_magicfile=True",
    "GSUtil:parallel_composite_upload_threshold=150M",
    "GSUtil:sliced_object_download_threshold=20M",
    "GSUtil:sliced_object_download_max_components=16",
];

/// Builds `-o ... -m rsync [-d] -r gs://<source> gs://<target>`.
pub fn rsync_args(run: &SyncRun) -> Vec<String> {
    let mut args = Vec::with_capacity(TUNING_OPTIONS.len() * 2 + 6);
    for option in TUNING_OPTIONS {
        args.push("-o".to_string());
        args.push(option.to_string());
    }
    args.push("-m".to_string());
    args.push("rsync".to_string());
    if run.delete_extraneous {
        args.push("-d".to_string());
    }
    args.push("-r".to_string());
    args.push(bucket_url(&run.source_bucket));
    args.push(bucket_url(&run.target_bucket));
    args
}

pub fn bucket_url(bucket: &str) -> String {
    format!("{BUCKET_SCHEME}://{bucket}")
}

/// Copies `reader` into `writer` until EOF, flushing at the end.
pub async fn forward<R, W>(mut reader: R, mut writer: W) -> std::io::Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let copied = tokio::io::copy(&mut reader, &mut writer).await?;
    writer.flush().await?;
    Ok(copied)
}

pub struct GsutilSync {
    program: String,
    timeout: Option<Duration>,
}

impl GsutilSync {
    pub fn new(program: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(config.gsutil.clone(), config.sync_timeout)
    }

    /// Waits for the child, then drains both forwarders.
    async fn finish(
        &self,
        child: &mut Child,
        stdout: Option<JoinHandle<std::io::Result<u64>>>,
        stderr: Option<JoinHandle<std::io::Result<u64>>>,
    ) -> Result<(ExitStatus, Result<u64, SyncError>, Result<u64, SyncError>), SyncError> {
        let status = child.wait().await.map_err(|source| {
            error!(error = ?source, program = %self.program, "[SYNC][ERROR] Failed to wait for sync tool");
            SyncError::Wait {
                program: self.program.clone(),
                source,
            }
        })?;

        let forwarded_out = match stdout {
            Some(handle) => self.join_forwarder("stdout", handle).await,
            None => Ok(0),
        };
        let forwarded_err = match stderr {
            Some(handle) => self.join_forwarder("stderr", handle).await,
            None => Ok(0),
        };
        Ok((status, forwarded_out, forwarded_err))
    }

    async fn join_forwarder(
        &self,
        stream: &'static str,
        handle: JoinHandle<std::io::Result<u64>>,
    ) -> Result<u64, SyncError> {
        let result = match handle.await {
            Ok(result) => result,
            Err(join_err) => Err(std::io::Error::other(join_err)),
        };
        result.map_err(|source| {
            error!(error = ?source, stream, program = %self.program, "[SYNC][ERROR] Output forwarding failed");
            SyncError::Forward {
                program: self.program.clone(),
                stream,
                source,
            }
        })
    }
}

#[async_trait]
impl SyncInvoker for GsutilSync {
    async fn sync(&self, run: &SyncRun) -> Result<(), SyncError> {
        let args = rsync_args(run);
        info!(program = %self.program, args = ?args, "[SYNC] Launching sync tool");

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| {
                error!(error = ?source, program = %self.program, "[SYNC][ERROR] Failed to launch sync tool");
                SyncError::Launch {
                    program: self.program.clone(),
                    source,
                }
            })?;

        // Measured from spawn; covers the wait and both forwarders.
        let deadline = self.timeout.map(|limit| Instant::now() + limit);

        let stdout = child.stdout.take().map(|out| tokio::spawn(forward(out, tokio::io::stdout())));
        let stderr = child.stderr.take().map(|err| tokio::spawn(forward(err, tokio::io::stderr())));
        let forwarders: Vec<AbortHandle> = [&stdout, &stderr]
            .into_iter()
            .flatten()
            .map(JoinHandle::abort_handle)
            .collect();

        let finished = self.finish(&mut child, stdout, stderr);
        let outcome = match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, finished).await.ok(),
            None => Some(finished.await),
        };

        let Some(outcome) = outcome else {
            let limit = self.timeout.unwrap_or_default();
            error!(program = %self.program, after = ?limit, "[SYNC][ERROR] Sync tool timed out, killing it");
            if let Err(e) = child.kill().await {
                warn!(error = ?e, program = %self.program, "[SYNC] Failed to kill sync tool");
            }
            // Grandchildren may still hold the pipes open.
            for handle in forwarders {
                handle.abort();
            }
            return Err(SyncError::TimedOut {
                program: self.program.clone(),
                after: limit,
            });
        };
        let (status, forwarded_out, forwarded_err) = outcome?;

        if !status.success() {
            error!(program = %self.program, status = %status, code = ?status.code(), "[SYNC][ERROR] Sync tool exited unsuccessfully");
            return Err(SyncError::Exited {
                program: self.program.clone(),
                status,
            });
        }

        let stdout_bytes = forwarded_out?;
        let stderr_bytes = forwarded_err?;
        debug!(stdout_bytes, stderr_bytes, "[SYNC] Forwarded sync tool output");
        info!(
            source = %run.source_bucket,
            target = %run.target_bucket,
            delete = run.delete_extraneous,
            "[SYNC] Sync tool finished successfully"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(delete_extraneous: bool) -> SyncRun {
        SyncRun {
            source_bucket: "b1".to_string(),
            target_bucket: "b2".to_string(),
            delete_extraneous,
        }
    }

    #[test]
    fn mirror_mode_includes_delete_flag() {
        let args = rsync_args(&run(true));
        assert_eq!(
            args,
            vec![
                "-o",
                "GSUtil:use_magicfile=True",
                "-o",
                "GSUtil:parallel_composite_upload_threshold=150M",
                "-o",
                "GSUtil:sliced_object_download_threshold=20M",
                "-o",
                "GSUtil:sliced_object_download_max_components=16",
                "-m",
                "rsync",
                "-d",
                "-r",
                "gs://b1",
                "gs://b2",
            ]
        );
    }

    #[test]
    fn plain_mode_omits_delete_flag() {
        let args = rsync_args(&run(false));
        assert!(!args.iter().any(|a| a == "-d"));
        assert_eq!(&args[args.len() - 4..], ["rsync", "-r", "gs://b1", "gs://b2"]);
    }

    #[test]
    fn bucket_names_are_only_prefixed() {
        assert_eq!(bucket_url("weird name/with..dots"), "gs://weird name/with..dots");
    }

    #[tokio::test]
    async fn forward_copies_every_byte_and_flushes() {
        let input: &[u8] = b"Building synchronization state...\nCopying gs://b1/a.txt\n";
        let mut sink: Vec<u8> = Vec::new();

        let copied = forward(input, &mut sink).await.unwrap();

        assert_eq!(copied as usize, input.len());
        assert_eq!(sink, input);
    }
}
