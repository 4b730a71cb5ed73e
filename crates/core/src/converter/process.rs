//! Child process runner for the external tool.

use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

use super::error::ConverterError;
use super::types::ToolRun;
use crate::cancel::CancelSignal;

/// Hides the console window of the child on Windows.
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Runs `executable` with `args` and waits for it to exit.
///
/// Stdin and stdout are closed; stderr is drained completely into the
/// returned diagnostic buffer. If the run exceeds `limit` the child is
/// killed and [`ConverterError::Timeout`] is returned; if `cancel` fires
/// first the child is killed and [`ConverterError::Cancelled`] is returned.
pub async fn run_tool(
    executable: &Path,
    args: &[String],
    limit: Duration,
    mut cancel: CancelSignal,
) -> Result<ToolRun, ConverterError> {
    if cancel.is_cancelled() {
        return Err(ConverterError::Cancelled);
    }

    let start = Instant::now();

    let mut command = Command::new(executable);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    #[cfg(windows)]
    command.creation_flags(CREATE_NO_WINDOW);

    let mut child = command.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConverterError::ExecutableNotFound {
                path: executable.to_path_buf(),
            }
        } else {
            ConverterError::Io(e)
        }
    })?;

    debug!(pid = ?child.id(), executable = %executable.display(), "Spawned converter");

    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| ConverterError::Io(std::io::Error::other("stderr was not captured")))?;

    let run = async {
        let mut buffer = Vec::new();
        stderr.read_to_end(&mut buffer).await?;
        let status = child.wait().await?;
        Ok::<_, std::io::Error>((status, buffer))
    };

    let result = tokio::select! {
        result = timeout(limit, run) => Some(result),
        _ = cancel.cancelled() => None,
    };

    match result {
        Some(Ok(Ok((status, buffer)))) => Ok(ToolRun {
            exit_code: status.code(),
            success: status.success(),
            diagnostics: String::from_utf8_lossy(&buffer).into_owned(),
            duration_ms: start.elapsed().as_millis() as u64,
        }),
        Some(Ok(Err(e))) => Err(ConverterError::Io(e)),
        Some(Err(_)) => {
            warn!(
                executable = %executable.display(),
                timeout_secs = limit.as_secs(),
                "Converter timed out, killing child"
            );
            let _ = child.kill().await;
            Err(ConverterError::Timeout {
                timeout_secs: limit.as_secs(),
            })
        }
        None => {
            debug!(executable = %executable.display(), "Conversion cancelled, killing child");
            let _ = child.kill().await;
            Err(ConverterError::Cancelled)
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::cancel::cancel_pair;
    use std::path::PathBuf;

    fn sh() -> PathBuf {
        PathBuf::from("/bin/sh")
    }

    fn script(body: &str) -> Vec<String> {
        vec!["-c".to_string(), body.to_string()]
    }

    #[tokio::test]
    async fn test_captures_stderr() {
        let run = run_tool(
            &sh(),
            &script("echo 'Error: something broke' >&2; exit 0"),
            Duration::from_secs(10),
            CancelSignal::never(),
        )
        .await
        .unwrap();

        assert!(run.success);
        assert_eq!(run.exit_code, Some(0));
        assert_eq!(run.diagnostics, "Error: something broke\n");
    }

    #[tokio::test]
    async fn test_clean_run_has_empty_diagnostics() {
        let run = run_tool(
            &sh(),
            &script("echo to-stdout; exit 3"),
            Duration::from_secs(10),
            CancelSignal::never(),
        )
        .await
        .unwrap();

        assert!(!run.success);
        assert_eq!(run.exit_code, Some(3));
        assert!(run.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_drains_large_stderr() {
        // More than a pipe buffer's worth of stderr must not deadlock.
        let run = run_tool(
            &sh(),
            &script("i=0; while [ $i -lt 4000 ]; do echo 'diagnostic line padding padding' >&2; i=$((i+1)); done"),
            Duration::from_secs(30),
            CancelSignal::never(),
        )
        .await
        .unwrap();

        assert_eq!(run.diagnostics.lines().count(), 4000);
    }

    #[tokio::test]
    async fn test_missing_executable() {
        let err = run_tool(
            Path::new("/nonexistent/bin/gs"),
            &[],
            Duration::from_secs(1),
            CancelSignal::never(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ConverterError::ExecutableNotFound { .. }));
    }

    #[tokio::test]
    async fn test_timeout_kills_child() {
        let start = Instant::now();
        let err = run_tool(
            &sh(),
            &script("sleep 30"),
            Duration::from_millis(200),
            CancelSignal::never(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ConverterError::Timeout { .. }));
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_cancel_kills_child() {
        let (handle, signal) = cancel_pair();
        let task = tokio::spawn(async move {
            run_tool(&sh(), &script("sleep 30"), Duration::from_secs(60), signal).await
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.cancel();

        let result = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(result, Err(ConverterError::Cancelled)));
    }

    #[tokio::test]
    async fn test_already_cancelled_does_not_spawn() {
        let (handle, signal) = cancel_pair();
        handle.cancel();

        let err = run_tool(
            Path::new("/nonexistent/bin/gs"),
            &[],
            Duration::from_secs(1),
            signal,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ConverterError::Cancelled));
    }
}
